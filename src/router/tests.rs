use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, UNIX_EPOCH};

use tempfile::TempDir;

use super::*;
use crate::config::test_parse_config;
use crate::freshness::get_mtime;

const A_JS: &str = "a = function(){}";
const B_JS: &str = "b = function(){}";

/// Scratch site: `{dir}/site` is the root, `{dir}/cache` the cache.
struct Site {
    dir: TempDir,
}

impl Site {
    fn new(files: &[(&str, &str)]) -> Self {
        let site = Self {
            dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(site.root()).unwrap();
        for (path, content) in files {
            site.write(path, content);
        }
        site
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("site")
    }

    fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn config(&self, extra: &str) -> PipelineConfig {
        let mut config = test_parse_config(&format!("root = \"site\"\ntemp = \"cache\"\n{extra}"));
        config.finalize(self.dir.path());
        config
    }

    fn router(&self, extra: &str) -> Router {
        Router::new(self.config(extra)).unwrap()
    }
}

fn scripts() -> Site {
    Site::new(&[("assets/a.js", A_JS), ("assets/b.js", B_JS)])
}

fn body(response: &AssetResponse) -> &str {
    std::str::from_utf8(&response.body).unwrap()
}

fn get(router: &Router, path: &str) -> AssetResponse {
    router.call(path, None).unwrap().expect("asset should match")
}

/// Compiler that upper-cases its input and counts invocations.
fn counting_compiler(calls: Arc<AtomicUsize>) -> impl Processor + 'static {
    move |source: &Path, target: &Path| -> Result<PathBuf> {
        calls.fetch_add(1, Ordering::SeqCst);
        let content = fs::read_to_string(source).map_err(|e| PipelineError::io(source, e))?;
        fs::write(target, content.to_uppercase()).map_err(|e| PipelineError::io(target, e))?;
        Ok(target.to_path_buf())
    }
}

// ============================================================================
// end-to-end scenarios
// ============================================================================

#[test]
fn test_bundle_in_filename_order() {
    let site = scripts();
    let router = site.router("combine = true\n[js]\napp = \"assets/**/*.js\"");

    let response = get(&router, "/app.js");
    assert_eq!(response.status, 200);
    assert_eq!(body(&response), format!("{A_JS}\n\n{B_JS}"));
    assert_eq!(
        response.header(CONTENT_TYPE),
        Some("application/javascript; charset=utf-8")
    );
    assert_eq!(response.header(CONTENT_LENGTH), Some(response.body.len().to_string().as_str()));
}

#[test]
fn test_single_asset() {
    let site = scripts();
    let router = site.router("combine = true\n[js]\napp = \"assets/**/*.js\"");

    let response = get(&router, "/assets/a.js");
    assert_eq!(body(&response), A_JS);
    assert_eq!(response.artifact, site.root().join("assets/a.js").canonicalize().unwrap());
}

#[test]
fn test_unrecognized_extension_falls_through() {
    let site = Site::new(&[("favicon.ico", "icon"), ("assets/a.js", A_JS)]);
    let router = site.router("[js]\napp = \"**/*\"");

    assert!(router.call("/favicon.ico", None).unwrap().is_none());
    assert!(router.call("/missing.js", None).unwrap().is_none());
    assert!(router.call("/", None).unwrap().is_none());
}

#[test]
fn test_source_compiled_once() {
    let site = Site::new(&[("assets/c.coffee", "c = -> 1")]);
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::builder(site.config("[js]\napp = \"assets/*.coffee\""))
        .compiler(".coffee", counting_compiler(calls.clone()))
        .build()
        .unwrap();

    let first = get(&router, "/assets/c.js");
    assert_eq!(body(&first), "C = -> 1");
    assert!(router.take_cache_busted());

    let second = get(&router, "/assets/c.js?v=2");
    assert_eq!(first.artifact, second.artifact);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!router.take_cache_busted());

    // The source extension itself is not servable
    assert!(router.call("/assets/c.coffee", None).unwrap().is_none());
}

#[test]
fn test_source_without_compiler_is_fatal() {
    let site = Site::new(&[("assets/c.coffee", "c = -> 1")]);
    let router = site.router("[js]\napp = \"assets/*.coffee\"");

    let err = router.call("/assets/c.js", None).unwrap_err();
    assert!(matches!(err, PipelineError::NoCompiler { .. }));
    assert_eq!(router.generation(), 1);
}

#[test]
fn test_stylesheets_and_content_type_override() {
    let site = Site::new(&[("css/site.css", "body { color: red; }")]);
    let router = site.router("[content_type]\n\".css\" = \"text/x-css\"");

    let response = get(&router, "/css/site.css");
    assert_eq!(response.header(CONTENT_TYPE), Some("text/x-css; charset=utf-8"));
    assert_eq!(body(&get(&router, "/app.css")), "body { color: red; }");
}

#[test]
fn test_compress_enabled() {
    let site = Site::new(&[("a.js", "globalThis.a = function () {\n  return 1;\n};\n")]);
    let router = site.router("compress = true");

    let response = get(&router, "/a.js");
    assert!(response.body.len() < fs::metadata(site.root().join("a.js")).unwrap().len() as usize);
    let name = response.artifact.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("a-"), "{name}");
    assert!(name.contains(".compress."), "{name}");
}

#[test]
fn test_lookalike_paths_do_not_evict_each_other() {
    let site = Site::new(&[("x.y/a.js", "dotted = 1;\n"), ("x_y/a.js", "underscored = 2;\n")]);
    let router = site.router("compress = true");

    let dotted = get(&router, "/x.y/a.js");
    let underscored = get(&router, "/x_y/a.js");
    assert_ne!(dotted.artifact, underscored.artifact);
    assert!(dotted.artifact.is_file());
    router.take_cache_busted();

    let repeat = get(&router, "/x.y/a.js");
    assert_eq!(repeat.artifact, dotted.artifact);
    assert!(!router.take_cache_busted());
    assert_eq!(router.generation(), 1);
}

// ============================================================================
// conditional GET
// ============================================================================

#[test]
fn test_conditional_get() {
    let site = scripts();
    let router = site.router("");
    let a = site.root().join("assets/a.js");
    File::options()
        .write(true)
        .open(&a)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(1_718_461_845))
        .unwrap();

    let fresh = get(&router, "/assets/a.js");
    let last_modified = fresh.header(LAST_MODIFIED).unwrap().to_string();
    assert_eq!(last_modified, "Sat, 15 Jun 2024 14:30:45 GMT");

    let cached = router.call("/assets/a.js", Some(&last_modified)).unwrap().unwrap();
    assert_eq!(cached.status, 304);
    assert!(cached.body.is_empty());
    assert_eq!(cached.header(LAST_MODIFIED), Some(last_modified.as_str()));
    assert_eq!(cached.header(CONTENT_TYPE), None);

    let stale = router
        .call("/assets/a.js", Some("Thu, 01 Jan 1970 00:00:00 GMT"))
        .unwrap()
        .unwrap();
    assert_eq!(stale.status, 200);
    assert_eq!(body(&stale), A_JS);
}

// ============================================================================
// repopulation
// ============================================================================

#[test]
fn test_vanished_member_repopulates() {
    let site = scripts();
    let router = site.router("[js]\napp = \"assets/**/*.js\"");
    assert_eq!(body(&get(&router, "/app.js")), format!("{A_JS}\n\n{B_JS}"));

    fs::remove_file(site.root().join("assets/b.js")).unwrap();
    assert_eq!(body(&get(&router, "/app.js")), A_JS);
    assert_eq!(router.generation(), 2);
    assert_eq!(router.snapshot().generation(), 2);
}

#[test]
fn test_new_member_after_repopulation() {
    let site = scripts();
    let router = site.router("");
    fs::remove_file(site.root().join("assets/a.js")).unwrap();
    site.write("assets/c.js", "c = 1");

    assert_eq!(body(&get(&router, "/app.js")), format!("{B_JS}\n\nc = 1"));
    assert!(router.call("/assets/a.js", None).unwrap().is_none());
    assert_eq!(body(&get(&router, "/assets/c.js")), "c = 1");
}

#[test]
fn test_failed_population_keeps_snapshot() {
    let site = scripts();
    let router = site.router("");
    fs::remove_dir_all(site.root()).unwrap();

    let err = router.call("/assets/a.js", None).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert_eq!(router.generation(), 1);
    assert!(router.snapshot().find_single(AssetType::Script, "assets/a.js").is_some());
}

#[cfg(unix)]
#[test]
fn test_generation_ceiling() {
    let site = scripts();
    std::os::unix::fs::symlink(site.root().join("nowhere.js"), site.root().join("assets/ghost.js"))
        .unwrap();
    let router = site.router("max_generations = 3");

    let err = router.call("/assets/ghost.js", None).unwrap_err();
    assert!(matches!(err, PipelineError::GenerationCeiling(3)));
    assert_eq!(router.generation(), 1 + 3);

    // Unaffected requests keep working
    assert_eq!(body(&get(&router, "/assets/a.js")), A_JS);

    // Each call gets its own budget; the counter keeps climbing
    let err = router.call("/assets/ghost.js", None).unwrap_err();
    assert!(matches!(err, PipelineError::GenerationCeiling(3)));
    assert_eq!(router.generation(), 1 + 3 + 3);
}

#[test]
fn test_concurrent_repopulation_coalesces() {
    let site = scripts();
    let router = site.router("");
    fs::remove_file(site.root().join("assets/b.js")).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| assert_eq!(body(&get(&router, "/app.js")), A_JS));
        }
    });
    assert_eq!(router.generation(), 2);
}

// ============================================================================
// listing
// ============================================================================

#[test]
fn test_assets_for_members_and_bundles() {
    let site = Site::new(&[
        ("vendor/jquery.js", "$"),
        ("app/a.js", A_JS),
        ("app/c.coffee", "c = -> 1"),
        ("admin/x.js", "x"),
    ]);
    let pipes = "[js]\napp = [\"vendor/*.js\", \"app/*\"]\nadmin = [\"vendor/*.js\", \"admin/*.js\"]";

    let members = site.router(pipes);
    assert_eq!(
        members.assets_for(&["app", "admin", "nope"], AssetType::Script),
        ["vendor/jquery.js", "app/a.js", "app/c.js", "admin/x.js"]
    );
    assert!(members.assets_for(&["app"], AssetType::Style).is_empty());

    let bundles = site.router(&format!("combine = true\n{pipes}"));
    assert_eq!(
        bundles.assets_for(&["app", "admin", "app"], AssetType::Script),
        ["app.js", "admin.js"]
    );
}

#[test]
fn test_cache_buster() {
    let site = scripts();
    let router = site.router("");
    File::options()
        .write(true)
        .open(site.root().join("assets/a.js"))
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(1_000_000))
        .unwrap();

    assert_eq!(router.cache_buster("/assets/a.js"), "?1000000");

    let bundle = get(&router, "/app.js");
    let built = crate::utils::date::unix_secs(get_mtime(&bundle.artifact).unwrap());
    assert_eq!(router.cache_buster("app.js"), format!("?{built}"));

    let now = router.cache_buster("never-built.js");
    assert!(now[1..].parse::<u64>().unwrap() >= built);
}
