mod common;

use std::fs;
use std::path::PathBuf;

use audiolang::config::Config;
use audiolang::fs::{FileSystem, OsFileSystem};

use common::{parse, run, run_in, World};

#[test]
fn runtime_error_stops_execution() {
    let (output, result) = run("print(\"a\"); int y = 10 / 0; print(\"b\");");
    assert_eq!(output, "a\n");
    let err = result.expect_err("expected a runtime error").to_string();
    assert!(err.contains("Division by zero."));
    assert!(!output.contains('b'));
}

#[test]
fn functions_run_regardless_of_definition_order() {
    let (output, result) = run("greet(); func void greet() { print(\"hello\"); }");
    result.unwrap();
    assert_eq!(output, "hello\n");
}

#[test]
fn custom_config_applies_to_the_whole_pipeline() {
    let config = Config::from_json_str("{\"max_func_depth\": 3}").unwrap();
    assert_eq!(config.max_func_depth, 3);
    // Untouched fields keep their defaults.
    assert_eq!(config.max_identifier_length, 128);

    let (_, result) = run_in(
        "func void down(int n) { if (n > 0) { down(n - 1); } } down(10);",
        &World::new(),
        &config,
        &[],
    );
    assert!(result
        .expect_err("expected a runtime error")
        .to_string()
        .contains("Maximum function call depth (3) exceeded."));
}

#[test]
fn pretty_printer_renders_the_tree() {
    let program = parse("func int f(int a) { return a; } int x = f(1);").unwrap();
    let rendered = audiolang::ast::pretty_print(&program);
    assert!(rendered.contains("Program"));
    assert!(rendered.contains("f"));
}

#[test]
fn end_to_end_library_organizer() {
    let world = World::with_music();
    world.fs.add_dir("/archive");
    let (output, result) = run_in(
        "func void archive_short(Folder src, Folder dst, int max_ms) { \
           List<Audio> tracks = src.list_audio(); \
           int i = 0; \
           while (i < tracks.len()) { \
             Audio t = tracks.get(i); \
             if (t.length < max_ms) { \
               t.move(dst); \
               print(\"archived \" + t.filename); \
             } \
             i = i + 1; \
           } \
         } \
         Folder music = Folder(\"/music\"); \
         Folder archive = Folder(\"/archive\"); \
         archive_short(music, archive, 120000);",
        &world,
        &Config::default(),
        &[],
    );
    result.unwrap();
    assert_eq!(output, "archived other.mp3\n");
    assert!(world.fs.is_file(std::path::Path::new("/archive/other.mp3")));
    assert!(world.fs.is_file(std::path::Path::new("/music/song.mp3")));
}

#[test]
fn os_file_system_smoke_test() {
    let dir = tempfile::tempdir().unwrap();
    let root: PathBuf = dir.path().to_path_buf();
    fs::write(root.join("a.txt"), "hello").unwrap();
    fs::create_dir(root.join("sub")).unwrap();

    let osfs = OsFileSystem;
    assert!(osfs.is_file(&root.join("a.txt")));
    assert!(osfs.is_dir(&root.join("sub")));

    osfs.rename(&root.join("a.txt"), &root.join("b.txt")).unwrap();
    assert!(!osfs.exists(&root.join("a.txt")));
    assert!(osfs.is_file(&root.join("b.txt")));

    let entries = osfs.list_dir(&root).unwrap();
    assert_eq!(entries.len(), 2);

    osfs.remove(&root.join("b.txt")).unwrap();
    assert!(!osfs.exists(&root.join("b.txt")));
}
