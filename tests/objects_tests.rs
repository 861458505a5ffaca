mod common;

use std::path::Path;

use audiolang::config::Config;
use audiolang::fs::FileSystem;

use common::{run_in, World};

fn run_music(source: &str) -> (String, World) {
    let world = World::with_music();
    let (output, result) = run_in(source, &world, &Config::default(), &[]);
    result.expect("program failed");
    (output, world)
}

fn run_music_err(source: &str) -> String {
    let world = World::with_music();
    let (_, result) = run_in(source, &world, &Config::default(), &[]);
    result.expect_err("expected a runtime error").to_string()
}

#[test]
fn file_constructor_requires_existing_file() {
    assert!(run_music_err("File f = File(\"/nope.txt\");")
        .contains("File path '/nope.txt' does not exist or is not a file."));
}

#[test]
fn folder_constructor_requires_directory() {
    assert!(run_music_err("Folder d = Folder(\"/music/notes.txt\");")
        .contains("Folder path '/music/notes.txt' does not exist or is not a directory."));
}

#[test]
fn audio_constructor_requires_decodable_file() {
    assert!(run_music_err("Audio a = Audio(\"/music/notes.txt\");")
        .contains("Cannot decode '/music/notes.txt' as audio: not a known audio file."));
}

#[test]
fn audio_metadata_attributes() {
    let (output, _) = run_music(
        "Audio a = Audio(\"/music/song.mp3\"); \
         print(itos(a.length)); \
         print(itos(a.bitrate)); \
         print(a.title);",
    );
    // 44100 Hz * 16 bit * 2 channels = 1411 kbps.
    assert_eq!(output, "180000\n1411\nSong\n");
}

#[test]
fn untagged_audio_falls_back_to_file_stem() {
    let (output, _) = run_music("Audio a = Audio(\"/music/other.mp3\"); print(a.title);");
    assert_eq!(output, "other\n");
}

#[test]
fn file_and_folder_attributes() {
    let (output, _) = run_music(
        "File f = File(\"/music/notes.txt\"); \
         print(f.filename); \
         print(btos(f.parent == null)); \
         Folder root = Folder(\"/\"); \
         Folder m = Folder(\"/music\"); \
         print(btos(root.is_root)); \
         print(btos(m.is_root)); \
         print(m.get_name());",
    );
    assert_eq!(output, "notes.txt\ntrue\ntrue\nfalse\nmusic\n");
}

#[test]
fn change_filename_renames_on_disk() {
    let (output, world) = run_music(
        "File f = File(\"/music/notes.txt\"); \
         f.change_filename(\"ideas.txt\"); \
         print(f.get_filename());",
    );
    assert_eq!(output, "ideas.txt\n");
    assert!(world.fs.is_file(Path::new("/music/ideas.txt")));
    assert!(!world.fs.is_file(Path::new("/music/notes.txt")));
}

#[test]
fn move_relocates_and_reparents() {
    let world = World::with_music();
    world.fs.add_dir("/backup");
    let (output, result) = run_in(
        "Folder b = Folder(\"/backup\"); \
         File f = File(\"/music/notes.txt\"); \
         f.move(b); \
         print(f.filename); \
         print(btos(f.parent == b));",
        &world,
        &Config::default(),
        &[],
    );
    result.unwrap();
    assert_eq!(output, "notes.txt\ntrue\n");
    assert!(world.fs.is_file(Path::new("/backup/notes.txt")));
    assert!(!world.fs.is_file(Path::new("/music/notes.txt")));
}

#[test]
fn delete_is_idempotent_but_blocks_other_methods() {
    let (_, world) = run_music(
        "File f = File(\"/music/notes.txt\"); \
         f.delete(); \
         f.delete();",
    );
    assert!(!world.fs.is_file(Path::new("/music/notes.txt")));

    assert!(run_music_err(
        "File f = File(\"/music/notes.txt\"); \
         f.delete(); \
         f.change_filename(\"x.txt\");"
    )
    .contains("File 'notes.txt' has been deleted."));
}

#[test]
fn add_file_copies_into_the_folder() {
    let world = World::with_music();
    world.fs.add_dir("/backup");
    let (_, result) = run_in(
        "Folder b = Folder(\"/backup\"); \
         File f = File(\"/music/notes.txt\"); \
         b.add_file(f);",
        &world,
        &Config::default(),
        &[],
    );
    result.unwrap();
    assert!(world.fs.is_file(Path::new("/backup/notes.txt")));
}

#[test]
fn get_file_finds_registered_children() {
    let (output, _) = run_music(
        "Folder m = Folder(\"/music\"); \
         File f = File(\"/music/notes.txt\"); \
         m.add_file(f); \
         File g = m.get_file(\"notes.txt\"); \
         print(btos(g == f)); \
         print(btos(m.get_file(\"ghost.txt\") == null));",
    );
    assert_eq!(output, "true\ntrue\n");
}

#[test]
fn remove_file_requires_a_registered_child() {
    assert!(
        run_music_err("Folder m = Folder(\"/music\"); m.remove_file(\"ghost.txt\");")
            .contains("Folder '/music' has no file 'ghost.txt'.")
    );
}

#[test]
fn remove_file_deletes_from_disk() {
    let (_, world) = run_music(
        "Folder m = Folder(\"/music\"); \
         File f = File(\"/music/notes.txt\"); \
         m.add_file(f); \
         m.remove_file(\"notes.txt\");",
    );
    assert!(!world.fs.is_file(Path::new("/music/notes.txt")));
}

#[test]
fn folder_listings() {
    let world = World::with_music();
    world.fs.add_dir("/music/live");
    let (output, result) = run_in(
        "Folder m = Folder(\"/music\"); \
         print(itos(m.list_files().len())); \
         print(itos(m.list_subfolders().len())); \
         print(itos(m.list_audio().len())); \
         print(m.list_audio().get(0).title);",
        &world,
        &Config::default(),
        &[],
    );
    result.unwrap();
    assert_eq!(output, "3\n1\n2\nother\n");
}

#[test]
fn get_subfolder() {
    let world = World::with_music();
    world.fs.add_dir("/music/live");
    let (output, result) = run_in(
        "Folder m = Folder(\"/music\"); \
         print(m.get_subfolder(\"live\").get_name()); \
         print(btos(m.get_subfolder(\"studio\") == null));",
        &world,
        &Config::default(),
        &[],
    );
    result.unwrap();
    assert_eq!(output, "live\ntrue\n");
}

#[test]
fn cut_shortens_the_clip() {
    let (output, world) = run_music(
        "Audio a = Audio(\"/music/song.mp3\"); \
         a.cut(0, 60000); \
         print(itos(a.length));",
    );
    assert_eq!(output, "60000\n");
    let clip = world.audio.clip(Path::new("/music/song.mp3")).unwrap();
    assert_eq!(clip.duration_ms, 60_000);
}

#[test]
fn cut_rejects_bad_ranges() {
    assert!(
        run_music_err("Audio a = Audio(\"/music/song.mp3\"); a.cut(0, 999999999);")
            .contains("Invalid cut parameters for audio 'Song'.")
    );
    assert!(
        run_music_err("Audio a = Audio(\"/music/song.mp3\"); a.cut(5000, 5000);")
            .contains("Invalid cut parameters for audio 'Song'.")
    );
}

#[test]
fn concat_adds_durations() {
    let (output, _) = run_music(
        "Audio a = Audio(\"/music/song.mp3\"); \
         Audio b = Audio(\"/music/other.mp3\"); \
         a.concat(b); \
         print(itos(a.length));",
    );
    assert_eq!(output, "240000\n");
}

#[test]
fn change_title_updates_tags() {
    let (output, world) = run_music(
        "Audio a = Audio(\"/music/song.mp3\"); \
         a.change_title(\"Renamed\"); \
         print(a.title);",
    );
    assert_eq!(output, "Renamed\n");
    let clip = world.audio.clip(Path::new("/music/song.mp3")).unwrap();
    assert_eq!(clip.tags.title.as_deref(), Some("Renamed"));
}

#[test]
fn title_is_assignable_as_a_property() {
    let (output, _) = run_music(
        "Audio a = Audio(\"/music/song.mp3\"); \
         a.title = \"New\"; \
         print(a.title);",
    );
    assert_eq!(output, "New\n");
}

#[test]
fn other_properties_are_read_only() {
    assert!(
        run_music_err("File f = File(\"/music/notes.txt\"); f.filename = \"x\";")
            .contains("Property 'filename' of type 'File' cannot be assigned.")
    );
}

#[test]
fn change_format_moves_the_file() {
    let (output, world) = run_music(
        "Audio a = Audio(\"/music/song.mp3\"); \
         a.change_format(\"wav\"); \
         print(a.filename);",
    );
    assert_eq!(output, "song.wav\n");
    assert!(world.fs.is_file(Path::new("/music/song.wav")));
    assert!(!world.fs.is_file(Path::new("/music/song.mp3")));
    assert!(world.audio.clip(Path::new("/music/song.wav")).is_some());
}

#[test]
fn change_volume_round_trips_the_clip() {
    let (_, world) = run_music("Audio a = Audio(\"/music/song.mp3\"); a.change_volume(-3.5);");
    assert!(world.audio.clip(Path::new("/music/song.mp3")).is_some());
}

#[test]
fn file_equality_is_by_path_and_parent() {
    let (output, _) = run_music(
        "File a = File(\"/music/notes.txt\"); \
         File b = File(\"/music/notes.txt\"); \
         File c = File(\"/music/song.mp3\"); \
         print(btos(a == b)); \
         print(btos(a == c)); \
         print(btos(a != c));",
    );
    assert_eq!(output, "true\nfalse\ntrue\n");
}

#[test]
fn audio_compares_as_its_file() {
    let (output, _) = run_music(
        "Audio a = Audio(\"/music/song.mp3\"); \
         File f = atof(a); \
         print(btos(f == a));",
    );
    assert_eq!(output, "true\n");
}

#[test]
fn ftoa_yields_null_for_non_audio() {
    let (output, _) = run_music(
        "File f = File(\"/music/notes.txt\"); \
         Audio a = ftoa(f); \
         print(btos(a == null)); \
         File g = File(\"/music/song.mp3\"); \
         Audio b = ftoa(g); \
         print(b.title);",
    );
    assert_eq!(output, "true\nSong\n");
}

#[test]
fn method_call_on_null_object() {
    assert!(run_music_err("File f = null; f.delete();")
        .contains("Attempted to access member 'delete' on null object."));
}

#[test]
fn mixed_audio_file_lists_carry_the_file_tag() {
    use audiolang::error::Position;
    use audiolang::objects;
    use audiolang::types::Type;
    use audiolang::value::common_element_type;

    let world = World::with_music();
    let pos = Position::new(1, 1);
    let audio =
        objects::construct_audio("/music/song.mp3", pos, &*world.fs, &*world.audio).unwrap();
    let file = objects::construct_file("/music/notes.txt", pos, &*world.fs).unwrap();

    // Widening is order-independent.
    assert_eq!(common_element_type(&[audio.clone(), file.clone()]), Type::File);
    assert_eq!(common_element_type(&[file, audio]), Type::File);
}
