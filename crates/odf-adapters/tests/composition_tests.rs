//! End-to-end tests: `init` then `create` against the repository templates,
//! on a real temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use odf_adapters::{CsvSchemaReader, DockerComposeRuntime, LocalFilesystem};
use odf_core::application::{
    ApplicationError, ComposeAction, CompositionService, EntityDraft, EntityPlan,
    OrchestrationService, ProfileService, ProjectService,
};
use odf_core::domain::{Catalog, Component, Identifier, Layer, Layout, Profile};
use odf_core::error::OdfError;
use serde_yaml::Value;
use tempfile::TempDir;

fn templates() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

fn projects() -> ProjectService {
    ProjectService::new(Box::new(LocalFilesystem::new()), Box::new(CsvSchemaReader::new()))
}

fn composer() -> CompositionService {
    CompositionService::new(Box::new(LocalFilesystem::new()), Catalog::builtin())
}

/// A parent directory holding `sources/` with the given CSV files.
fn workspace(sources: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("sources");
    fs::create_dir_all(&data).unwrap();
    for (name, content) in sources {
        fs::write(data.join(name), content).unwrap();
    }
    dir
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| panic!("{}: {e}", path.as_ref().display()))
}

fn compose(root: &Path) -> Value {
    serde_yaml::from_str(&read(root.join("platform/docker-compose.yaml"))).unwrap()
}

/// `demo` with `events` (api, analytics, status page) and `orders` (api only).
fn init_demo(dir: &TempDir) -> PathBuf {
    let project = Identifier::parse("demo").unwrap();
    let projects = projects();
    let root = projects
        .prepare_workspace(dir.path(), &project, &dir.path().join("sources"))
        .unwrap();

    let plans: Vec<EntityPlan> = projects
        .discover_sources(&root, Profile::Custom)
        .unwrap()
        .into_iter()
        .map(|draft| {
            let plan = EntityPlan::new(draft).with_component(Layer::Api, Component::ApiPostgres);
            if plan.draft.plural_name == "events" {
                plan.with_component(Layer::Analytics, Component::Superset)
                    .with_component(Layer::Utility, Component::Nginx)
            } else {
                plan
            }
        })
        .collect();

    ProfileService::new(projects, Catalog::builtin())
        .init_custom(&root, &project, Layout::Custom, &plans)
        .unwrap();
    root
}

const EVENTS: &str = "id,name,value,logged_at\n1,boot,0.5,2024-01-01 00:00:00\n";
const ORDERS: &str = "order_id,amount\n7,12.5\n";

#[test]
fn test_settings_document_is_written_on_init() {
    let dir = workspace(&[("events.csv", EVENTS), ("orders.csv", ORDERS)]);
    let root = init_demo(&dir);

    let settings: serde_json::Value = serde_json::from_str(&read(root.join("settings.json"))).unwrap();
    assert_eq!(settings["project"], "demo");
    assert_eq!(settings["ports"]["postgres"], "5432");
    assert_eq!(settings["ports"]["superset"], "8088");
    assert_eq!(
        settings["entities"]["orders"]["layers"]["api"]["api-postgres"]["port"],
        "8001"
    );
    assert_eq!(settings["entities"]["events"]["fields"]["value"], "float");
    assert!(root.join("data/events.csv").is_file());
}

#[test]
fn test_create_merges_compose_fragments() {
    let dir = workspace(&[("events.csv", EVENTS), ("orders.csv", ORDERS)]);
    let root = init_demo(&dir);

    let report = composer().create(&root, &templates()).unwrap();
    assert!(!report.components.is_empty());

    let manifest = compose(&root);
    assert_eq!(manifest["name"], "demo");
    for service in ["superset", "api-events", "api-orders", "postgres", "nginx"] {
        assert!(
            manifest["services"].get(service).is_some(),
            "missing service {service}"
        );
    }
    assert!(manifest["services"].get("texlive").is_none());
    assert_eq!(manifest["networks"]["demo_default"]["name"], "demo_default");
    assert!(manifest["volumes"].get("postgres_data").is_some());

    let events = &manifest["services"]["api-events"];
    assert_eq!(events["ports"][0], "8000:8000");
    assert_eq!(events["hostname"], "demo-api-postgres");
    assert_eq!(events["build"], "./api/api-postgres/events");
    assert_eq!(manifest["services"]["api-orders"]["ports"][0], "8001:8000");
    assert_eq!(manifest["services"]["postgres"]["hostname"], "demo-postgres");

    assert!(!read(root.join("platform/docker-compose.yaml")).contains("project_name"));
}

#[test]
fn test_storage_setup_runs_first() {
    let dir = workspace(&[("events.csv", EVENTS), ("orders.csv", ORDERS)]);
    let root = init_demo(&dir);
    composer().create(&root, &templates()).unwrap();

    let setup = read(root.join("platform/setup.sh"));
    let lines: Vec<&str> = setup.lines().collect();
    assert_eq!(lines[0], "#!/usr/bin/env bash");
    assert_eq!(lines[4], "docker compose --profile storage up -d --wait");

    let storage = setup.find("--profile storage").unwrap();
    let analytics = setup.find("--profile analytics").unwrap();
    assert!(storage < analytics);

    assert!(setup.contains("--table events"));
    assert!(!setup.contains("--table orders"));
    assert!(setup.contains("demo-superset"));
    assert!(!setup.contains("project_name"));
    assert!(!setup.contains("table-name"));
}

#[test]
fn test_api_subtrees_are_rewritten_per_entity() {
    let dir = workspace(&[("events.csv", EVENTS), ("orders.csv", ORDERS)]);
    let root = init_demo(&dir);
    composer().create(&root, &templates()).unwrap();

    let events = root.join("platform/api/api-postgres/events");
    let models = read(events.join("app/models.py"));
    assert!(models.contains("class Event(SQLModel, table=True):"));
    assert!(models.contains(r#"__tablename__ = "events""#));
    assert!(models.contains("    # fields\n"));
    assert!(models.contains("    logged_at: datetime\n"));
    assert!(models.contains("    value: float\n"));
    assert!(!models.contains("# extra fields"));

    let router = read(events.join("app/router.py"));
    assert!(router.contains(r#"APIRouter(prefix="/events""#));
    assert!(router.contains("event_router"));
    assert!(read(events.join("app/main.py")).contains("from app.router import event_router"));

    let env = read(events.join(".env"));
    assert!(env.contains("PROJECT=demo"));
    assert!(env.contains("@postgres:5432/demo"));

    // compose fragments are consumed, the rest of the subtree stays
    assert!(!events.join("docker-compose.yaml").exists());
    assert!(events.join("Dockerfile").is_file());
    assert!(root.join("platform/api/api-postgres/orders/app/crud.py").is_file());
}

#[test]
fn test_field_names_survive_template_tokens() {
    let dir = workspace(&[(
        "events.csv",
        "id,entities_count,project_name_ref\n1,3,7\n",
    )]);
    let root = init_demo(&dir);
    composer().create(&root, &templates()).unwrap();

    let models = read(root.join("platform/api/api-postgres/events/app/models.py"));
    assert!(models.contains("    entities_count: int\n"));
    assert!(models.contains("    project_name_ref: int\n"));
    assert!(!models.contains("events_count"));
    assert!(models.contains(r#"__tablename__ = "events""#));
}

#[test]
fn test_zero_byte_source_yields_entity_without_fields() {
    let dir = workspace(&[("events.csv", "")]);
    let entity = projects()
        .build_entity(&EntityDraft {
            source: dir.path().join("sources/events.csv"),
            name: "event".into(),
            plural_name: "events".into(),
            description: String::new(),
        })
        .unwrap();
    assert!(entity.fields().is_empty());
}

#[test]
fn test_init_tolerates_zero_byte_source() {
    let dir = workspace(&[("events.csv", EVENTS), ("orders.csv", "")]);
    let root = init_demo(&dir);

    let settings: serde_json::Value = serde_json::from_str(&read(root.join("settings.json"))).unwrap();
    assert_eq!(settings["entities"]["orders"]["fields"], serde_json::json!({}));
    assert_eq!(settings["entities"]["events"]["fields"]["id"], "int");
}

#[test]
fn test_superset_and_status_page() {
    let dir = workspace(&[("events.csv", EVENTS), ("orders.csv", ORDERS)]);
    let root = init_demo(&dir);
    composer().create(&root, &templates()).unwrap();

    let env = read(root.join("platform/analytics/superset/.env"));
    assert!(!env.contains(r#"SUPERSET_SECRET_KEY="""#));
    assert!(env.contains("SUPERSET_SECRET_KEY=\""));
    assert!(!root.join("platform/analytics/superset/database").exists());
    assert!(!root.join("platform/analytics/superset/setup.sh").exists());

    let page = read(root.join("platform/utility/nginx/static/index.html"));
    assert!(page.contains("<title>demo</title>"));
    assert!(page.contains("http://localhost:5432/"));
    assert!(page.contains("api-postgres | events"));
    assert!(!page.contains("api-postgres | orders"));
    assert!(page.contains(r#"class="badge badge-warning gap-2">storage"#));
    assert!(!page.contains("component_name"));

    // project-wide rows in catalog order, then the entity rows
    let row = |needle: &str| page.find(needle).unwrap_or_else(|| panic!("no row {needle}"));
    assert!(row("http://localhost:8088/") < row("http://localhost:5432/"));
    assert!(row("http://localhost:5432/") < row("api-postgres | events"));
}

#[test]
fn test_root_artifacts_are_collected() {
    let dir = workspace(&[("events.csv", EVENTS), ("orders.csv", ORDERS)]);
    let root = init_demo(&dir);
    composer().create(&root, &templates()).unwrap();

    assert!(read(root.join("README.md")).starts_with("# demo\n"));
    assert!(root.join("ingest.py").is_file());

    let requirements = read(root.join("requirements.txt"));
    assert!(requirements.contains("pandas"));
    assert!(requirements.contains("httpx"));

    let start = read(root.join("platform/start.sh"));
    assert!(start.contains("--profile api up -d"));
    assert!(start.contains("--profile utility up -d"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for script in ["build.sh", "setup.sh", "start.sh", "stop.sh"] {
            let mode = fs::metadata(root.join("platform").join(script))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o111, 0o111, "{script} is not executable");
        }
    }
}

#[test]
fn test_create_twice_fails_without_overwriting() {
    let dir = workspace(&[("events.csv", EVENTS), ("orders.csv", ORDERS)]);
    let root = init_demo(&dir);
    composer().create(&root, &templates()).unwrap();
    let before = read(root.join("platform/docker-compose.yaml"));

    let err = composer().create(&root, &templates()).unwrap_err();
    assert!(matches!(
        err,
        OdfError::Application(ApplicationError::AlreadyExists { .. })
    ));
    assert_eq!(read(root.join("platform/docker-compose.yaml")), before);
}

#[test]
fn test_research_profile_end_to_end() {
    let dir = workspace(&[("glass.csv", "sample,refractive_index\nA,1.52\n")]);
    let project = Identifier::parse("study").unwrap();
    let projects = projects();
    let root = projects
        .prepare_workspace(dir.path(), &project, &dir.path().join("sources"))
        .unwrap();

    ProfileService::new(projects, Catalog::builtin())
        .init_research(&root, &project)
        .unwrap();
    composer().create(&root, &templates()).unwrap();

    assert!(root.join("data/raw/glass.csv").is_file());
    assert!(!root.join("data/glass.csv").exists());
    assert!(root.join("paper/main.tex").is_file());
    assert!(root.join("output").is_dir());
    assert!(!root.join("output/.gitkeep").exists());

    let devcontainer: serde_json::Value = serde_json::from_str(&read(
        root.join("platform/devcontainers/R/.devcontainer/devcontainer.json"),
    ))
    .unwrap();
    assert_eq!(devcontainer["name"], "study");
    assert_eq!(devcontainer["workspaceFolder"], "/study");
    assert!(
        devcontainer["mounts"][0]
            .as_str()
            .unwrap()
            .contains("target=/study/data")
    );

    let manifest = compose(&root);
    let volumes: Vec<&str> = manifest["services"]["texlive"]["volumes"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(volumes.contains(&"../paper:/usr/src/app/mnt/paper"));
    assert!(volumes.contains(&"../output:/usr/src/app/mnt/output"));

    // no api layer, so no ingestion script
    assert!(!root.join("ingest.py").exists());
}

#[test]
fn test_missing_templates_are_reported() {
    let dir = workspace(&[("events.csv", EVENTS)]);
    let root = init_demo(&dir);

    let err = composer()
        .create(&root, &dir.path().join("no-templates"))
        .unwrap_err();
    assert!(matches!(
        err,
        OdfError::Application(ApplicationError::NotFound { .. })
    ));
    assert!(!root.join("platform").exists());
}

#[cfg(unix)]
#[test]
fn test_orchestration_runs_against_generated_platform() {
    let dir = workspace(&[("events.csv", EVENTS)]);
    let root = init_demo(&dir);
    composer().create(&root, &templates()).unwrap();

    let ok = OrchestrationService::new(
        Box::new(LocalFilesystem::new()),
        Box::new(DockerComposeRuntime::with_program("true")),
        Catalog::builtin(),
    );
    ok.run(&root, ComposeAction::Start).unwrap();
    ok.run(&root, ComposeAction::Status).unwrap();

    let failing = OrchestrationService::new(
        Box::new(LocalFilesystem::new()),
        Box::new(DockerComposeRuntime::with_program("false")),
        Catalog::builtin(),
    );
    let err = failing.run(&root, ComposeAction::Build).unwrap_err();
    assert!(matches!(
        err,
        OdfError::Application(ApplicationError::ExternalCommand { .. })
    ));
}
