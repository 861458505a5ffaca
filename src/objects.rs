use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::audio::{AudioBackend, AudioError, Clip};
use crate::error::{Position, RuntimeError};
use crate::fs::FileSystem;
use crate::types::Type;
use crate::value::Value;

/// A file known to the program. `deleted` is set once the physical file
/// has been removed; most operations on a deleted file fail.
#[derive(Debug)]
pub struct FileState {
    pub path: PathBuf,
    pub parent: Option<Rc<RefCell<FolderState>>>,
    pub deleted: bool,
}

impl FileState {
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct FolderState {
    pub path: PathBuf,
    pub is_root: bool,
    pub deleted: bool,
    /// Files registered with this folder (plain files and audio).
    pub files: Vec<Value>,
}

impl FolderState {
    pub fn name(&self) -> String {
        match self.path.file_name() {
            Some(n) => n.to_string_lossy().into_owned(),
            None => self.path.display().to_string(),
        }
    }
}

/// An audio file: file identity plus decoded metadata. Metadata is
/// refreshed by the mutating methods, each of which decodes once and
/// exports once.
#[derive(Debug)]
pub struct AudioState {
    pub file: FileState,
    pub length_ms: i64,
    pub bitrate_kbps: i64,
    pub title: String,
}

fn fs_error(e: io::Error, pos: Position) -> RuntimeError {
    RuntimeError::at(format!("File system error: {}.", e), pos)
}

fn audio_error(e: AudioError, pos: Position) -> RuntimeError {
    RuntimeError::at(e.to_string(), pos)
}

// --- Construction ---

pub fn construct_file(
    path: &str,
    pos: Position,
    fs: &dyn FileSystem,
) -> Result<Value, RuntimeError> {
    let path = PathBuf::from(path);
    if !fs.is_file(&path) {
        return Err(RuntimeError::at(
            format!("File path '{}' does not exist or is not a file.", path.display()),
            pos,
        ));
    }
    Ok(Value::File(Rc::new(RefCell::new(FileState {
        path,
        parent: None,
        deleted: false,
    }))))
}

pub fn construct_folder(
    path: &str,
    pos: Position,
    fs: &dyn FileSystem,
) -> Result<Value, RuntimeError> {
    let path = PathBuf::from(path);
    if !fs.is_dir(&path) {
        return Err(RuntimeError::at(
            format!(
                "Folder path '{}' does not exist or is not a directory.",
                path.display()
            ),
            pos,
        ));
    }
    let is_root = path.parent().is_none();
    Ok(Value::Folder(Rc::new(RefCell::new(FolderState {
        path,
        is_root,
        deleted: false,
        files: Vec::new(),
    }))))
}

pub fn construct_audio(
    path: &str,
    pos: Position,
    fs: &dyn FileSystem,
    audio: &dyn AudioBackend,
) -> Result<Value, RuntimeError> {
    let path = PathBuf::from(path);
    if !fs.is_file(&path) {
        return Err(RuntimeError::at(
            format!("File path '{}' does not exist or is not a file.", path.display()),
            pos,
        ));
    }
    let clip = audio.decode(&path).map_err(|e| audio_error(e, pos))?;
    Ok(audio_from_clip(path, None, &clip))
}

pub fn audio_from_clip(
    path: PathBuf,
    parent: Option<Rc<RefCell<FolderState>>>,
    clip: &Clip,
) -> Value {
    let title = clip.tags.title.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    Value::Audio(Rc::new(RefCell::new(AudioState {
        file: FileState {
            path,
            parent,
            deleted: false,
        },
        length_ms: clip.duration_ms,
        bitrate_kbps: clip.bitrate_kbps(),
        title,
    })))
}

// --- Structural equality ---

/// Files (and audio) compare by path plus parent path; folders by path
/// plus root flag. Anything else is unequal, including two lists.
pub fn objects_equal(left: &Value, right: &Value) -> bool {
    if left.is_null() && right.is_null() {
        return true;
    }
    if left.is_null() != right.is_null() {
        return false;
    }

    match (file_handle_parts(left), file_handle_parts(right)) {
        (Some((lp, lparent)), Some((rp, rparent))) => {
            let parent_match = match (lparent, rparent) {
                (None, None) => true,
                (Some(a), Some(b)) => a.borrow().path == b.borrow().path,
                _ => false,
            };
            return lp == rp && parent_match;
        }
        (None, None) => {}
        _ => return false,
    }

    if let (Value::Folder(a), Value::Folder(b)) = (left, right) {
        let a = a.borrow();
        let b = b.borrow();
        return a.path == b.path && a.is_root == b.is_root;
    }

    false
}

fn file_handle_parts(value: &Value) -> Option<(PathBuf, Option<Rc<RefCell<FolderState>>>)> {
    match value {
        Value::File(rc) => {
            let state = rc.borrow();
            Some((state.path.clone(), state.parent.clone()))
        }
        Value::Audio(rc) => {
            let state = rc.borrow();
            Some((state.file.path.clone(), state.file.parent.clone()))
        }
        _ => None,
    }
}

// --- Attribute access ---

pub fn get_attribute(
    receiver: &Value,
    name: &str,
    pos: Position,
    fs: &dyn FileSystem,
) -> Result<Value, RuntimeError> {
    match receiver {
        Value::File(rc) => file_attribute(&rc.borrow(), name)
            .ok_or_else(|| RuntimeError::at(format!("File has no attribute '{}'.", name), pos)),
        Value::Audio(rc) => {
            let state = rc.borrow();
            match name {
                "length" => Ok(Value::int(state.length_ms)),
                "bitrate" => Ok(Value::int(state.bitrate_kbps)),
                "title" => Ok(Value::string(state.title.clone())),
                _ => file_attribute(&state.file, name).ok_or_else(|| {
                    RuntimeError::at(format!("Audio has no attribute '{}'.", name), pos)
                }),
            }
        }
        Value::Folder(rc) => match name {
            "is_root" => Ok(Value::bool(rc.borrow().is_root)),
            "files" => list_files(rc, pos, fs),
            "subfolders" => list_subfolders(rc, pos, fs),
            _ => Err(RuntimeError::at(
                format!("Folder has no attribute '{}'.", name),
                pos,
            )),
        },
        other => Err(RuntimeError::at(
            format!("Type '{}' has no attribute '{}'.", other.type_of(), name),
            pos,
        )),
    }
}

fn file_attribute(state: &FileState, name: &str) -> Option<Value> {
    match name {
        "filename" => Some(Value::string(state.filename())),
        "parent" => Some(match &state.parent {
            Some(folder) => Value::Folder(folder.clone()),
            None => Value::Null,
        }),
        _ => None,
    }
}

pub fn set_attribute(
    receiver: &Value,
    name: &str,
    value: &Value,
    pos: Position,
) -> Result<(), RuntimeError> {
    if let (Value::Audio(rc), "title", Value::Str(text)) = (receiver, name, value) {
        rc.borrow_mut().title = text.borrow().clone();
        return Ok(());
    }
    Err(RuntimeError::at(
        format!(
            "Property '{}' of type '{}' cannot be assigned.",
            name,
            receiver.type_of()
        ),
        pos,
    ))
}

// --- Method dispatch ---

pub fn call_method(
    receiver: &Value,
    name: &str,
    args: &[Value],
    pos: Position,
    fs: &dyn FileSystem,
    audio: &dyn AudioBackend,
) -> Result<Value, RuntimeError> {
    match receiver {
        Value::List(rc) => list_method(rc, name, args, pos),
        Value::File(_) => file_method(receiver, name, args, pos, fs).and_then(|r| {
            r.ok_or_else(|| RuntimeError::at(format!("File has no method '{}'.", name), pos))
        }),
        Value::Audio(_) => {
            if let Some(result) = audio_method(receiver, name, args, pos, fs, audio)? {
                return Ok(result);
            }
            if let Some(result) = file_method(receiver, name, args, pos, fs)? {
                return Ok(result);
            }
            Err(RuntimeError::at(
                format!("Audio has no method '{}'.", name),
                pos,
            ))
        }
        Value::Folder(rc) => folder_method(rc, name, args, pos, fs, audio),
        other => Err(RuntimeError::at(
            format!("Type '{}' has no method '{}'.", other.type_of(), name),
            pos,
        )),
    }
}

fn list_method(
    rc: &Rc<RefCell<crate::value::ListValue>>,
    name: &str,
    args: &[Value],
    pos: Position,
) -> Result<Value, RuntimeError> {
    match name {
        "get" => {
            let [Value::Int(index)] = args else {
                return Err(RuntimeError::at("List.get() expects 1 integer argument.", pos));
            };
            let idx = index.get();
            let list = rc.borrow();
            if idx < 0 || idx as usize >= list.elements.len() {
                return Err(RuntimeError::at(
                    format!(
                        "List index {} out of bounds for list of size {}.",
                        idx,
                        list.elements.len()
                    ),
                    pos,
                ));
            }
            Ok(list.elements[idx as usize].clone())
        }
        "len" => {
            if !args.is_empty() {
                return Err(RuntimeError::at("List.len() takes no arguments.", pos));
            }
            Ok(Value::int(rc.borrow().elements.len() as i64))
        }
        _ => Err(RuntimeError::at(
            format!("List has no method '{}'.", name),
            pos,
        )),
    }
}

/// Runs `f` on the file identity of a File or Audio value.
fn with_file_state<R>(
    receiver: &Value,
    f: impl FnOnce(&mut FileState) -> R,
) -> Result<R, RuntimeError> {
    match receiver {
        Value::File(rc) => Ok(f(&mut rc.borrow_mut())),
        Value::Audio(rc) => Ok(f(&mut rc.borrow_mut().file)),
        _ => Err(RuntimeError::new("Internal: expected a file value.")),
    }
}

fn check_file_not_deleted(receiver: &Value, pos: Position) -> Result<(), RuntimeError> {
    with_file_state(receiver, |state| {
        if state.deleted {
            Err(RuntimeError::at(
                format!("File '{}' has been deleted.", state.filename()),
                pos,
            ))
        } else {
            Ok(())
        }
    })?
}

/// Drops `file` from the registered children of its current parent and
/// clears the back-reference.
fn detach_from_parent(file: &Value) -> Result<(), RuntimeError> {
    let parent = with_file_state(file, |state| state.parent.take())?;
    if let Some(folder) = parent {
        folder.borrow_mut().files.retain(|v| !same_handle(v, file));
    }
    Ok(())
}

fn same_handle(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::File(x), Value::File(y)) => Rc::ptr_eq(x, y),
        (Value::Audio(x), Value::Audio(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// File methods, shared by File and Audio receivers. Returns `None` when
/// the method name is unknown so Audio can report its own type.
fn file_method(
    receiver: &Value,
    name: &str,
    args: &[Value],
    pos: Position,
    fs: &dyn FileSystem,
) -> Result<Option<Value>, RuntimeError> {
    match name {
        "get_filename" => {
            if !args.is_empty() {
                return Err(RuntimeError::at("File.get_filename() takes no arguments.", pos));
            }
            let filename = with_file_state(receiver, |state| state.filename())?;
            Ok(Some(Value::string(filename)))
        }
        "change_filename" => {
            let [Value::Str(new_name)] = args else {
                return Err(RuntimeError::at(
                    "File.change_filename() expects 1 string argument.",
                    pos,
                ));
            };
            check_file_not_deleted(receiver, pos)?;
            let new_name = new_name.borrow().clone();
            let old_path = with_file_state(receiver, |state| state.path.clone())?;
            let new_path = match old_path.parent() {
                Some(dir) => dir.join(&new_name),
                None => PathBuf::from(&new_name),
            };
            fs.rename(&old_path, &new_path).map_err(|e| fs_error(e, pos))?;
            with_file_state(receiver, |state| state.path = new_path)?;
            Ok(Some(Value::Null))
        }
        "move" => {
            let [Value::Folder(target)] = args else {
                return Err(RuntimeError::at("File.move() expects 1 Folder argument.", pos));
            };
            check_file_not_deleted(receiver, pos)?;
            check_folder_not_deleted(target, pos)?;

            let old_path = with_file_state(receiver, |state| state.path.clone())?;
            let filename = with_file_state(receiver, |state| state.filename())?;
            let dest = target.borrow().path.join(filename);
            if dest != old_path {
                fs.rename(&old_path, &dest).map_err(|e| fs_error(e, pos))?;
            }

            detach_from_parent(receiver)?;
            with_file_state(receiver, |state| {
                state.path = dest;
                state.parent = Some(target.clone());
            })?;
            target.borrow_mut().files.push(receiver.clone());
            Ok(Some(Value::Null))
        }
        "delete" => {
            if !args.is_empty() {
                return Err(RuntimeError::at("File.delete() takes no arguments.", pos));
            }
            // Deleting twice is a no-op.
            let already = with_file_state(receiver, |state| state.deleted)?;
            if already {
                return Ok(Some(Value::Null));
            }
            let path = with_file_state(receiver, |state| state.path.clone())?;
            fs.remove(&path).map_err(|e| fs_error(e, pos))?;
            detach_from_parent(receiver)?;
            with_file_state(receiver, |state| state.deleted = true)?;
            Ok(Some(Value::Null))
        }
        _ => Ok(None),
    }
}

fn check_folder_not_deleted(
    rc: &Rc<RefCell<FolderState>>,
    pos: Position,
) -> Result<(), RuntimeError> {
    let state = rc.borrow();
    if state.deleted {
        return Err(RuntimeError::at(
            format!("Folder '{}' has been deleted.", state.path.display()),
            pos,
        ));
    }
    Ok(())
}

fn folder_method(
    rc: &Rc<RefCell<FolderState>>,
    name: &str,
    args: &[Value],
    pos: Position,
    fs: &dyn FileSystem,
    audio: &dyn AudioBackend,
) -> Result<Value, RuntimeError> {
    match name {
        "get_file" => {
            let [Value::Str(wanted)] = args else {
                return Err(RuntimeError::at(
                    "Folder.get_file() expects 1 string argument.",
                    pos,
                ));
            };
            let wanted = wanted.borrow().clone();
            let state = rc.borrow();
            for child in &state.files {
                let matches = with_file_state(child, |file| {
                    !file.deleted && file.filename() == wanted
                })?;
                if matches {
                    return Ok(child.clone());
                }
            }
            Ok(Value::Null)
        }
        "add_file" => {
            let child = match args {
                [v @ (Value::File(_) | Value::Audio(_))] => v,
                _ => {
                    return Err(RuntimeError::at(
                        "Folder.add_file() expects 1 File argument.",
                        pos,
                    ));
                }
            };
            check_folder_not_deleted(rc, pos)?;

            let source = with_file_state(child, |state| state.path.clone())?;
            let filename = with_file_state(child, |state| state.filename())?;
            let dest = rc.borrow().path.join(filename);
            if dest != source && fs.exists(&source) {
                fs.copy(&source, &dest).map_err(|e| fs_error(e, pos))?;
            }

            detach_from_parent(child)?;
            with_file_state(child, |state| {
                state.path = dest;
                state.parent = Some(rc.clone());
                // Re-adding restores a previously deleted file.
                state.deleted = false;
            })?;
            rc.borrow_mut().files.push(child.clone());
            Ok(Value::Null)
        }
        "remove_file" => {
            let [Value::Str(wanted)] = args else {
                return Err(RuntimeError::at(
                    "Folder.remove_file() expects 1 string argument.",
                    pos,
                ));
            };
            let wanted = wanted.borrow().clone();
            let found = {
                let state = rc.borrow();
                let mut found = None;
                for child in &state.files {
                    let matches = with_file_state(child, |file| {
                        !file.deleted && file.filename() == wanted
                    })?;
                    if matches {
                        found = Some(child.clone());
                        break;
                    }
                }
                found
            };
            let Some(child) = found else {
                return Err(RuntimeError::at(
                    format!(
                        "Folder '{}' has no file '{}'.",
                        rc.borrow().path.display(),
                        wanted
                    ),
                    pos,
                ));
            };
            let path = with_file_state(&child, |state| state.path.clone())?;
            fs.remove(&path).map_err(|e| fs_error(e, pos))?;
            detach_from_parent(&child)?;
            with_file_state(&child, |state| state.deleted = true)?;
            Ok(Value::Null)
        }
        "list_files" => {
            if !args.is_empty() {
                return Err(RuntimeError::at("Folder.list_files() takes no arguments.", pos));
            }
            list_files(rc, pos, fs)
        }
        "list_subfolders" => {
            if !args.is_empty() {
                return Err(RuntimeError::at(
                    "Folder.list_subfolders() takes no arguments.",
                    pos,
                ));
            }
            list_subfolders(rc, pos, fs)
        }
        "list_audio" => {
            if !args.is_empty() {
                return Err(RuntimeError::at("Folder.list_audio() takes no arguments.", pos));
            }
            let state = rc.borrow();
            let entries = fs.list_dir(&state.path).map_err(|e| fs_error(e, pos))?;
            let mut audios = Vec::new();
            for entry in entries {
                if !fs.is_file(&entry) {
                    continue;
                }
                // Non-audio entries are skipped silently.
                if let Ok(clip) = audio.decode(&entry) {
                    audios.push(audio_from_clip(entry, Some(rc.clone()), &clip));
                }
            }
            Ok(Value::list(Type::Audio, audios))
        }
        "get_subfolder" => {
            let [Value::Str(wanted)] = args else {
                return Err(RuntimeError::at(
                    "Folder.get_subfolder() expects 1 string argument.",
                    pos,
                ));
            };
            let candidate = rc.borrow().path.join(wanted.borrow().as_str());
            if !fs.is_dir(&candidate) {
                return Ok(Value::Null);
            }
            Ok(Value::Folder(Rc::new(RefCell::new(FolderState {
                path: candidate,
                is_root: false,
                deleted: false,
                files: Vec::new(),
            }))))
        }
        "get_name" => {
            if !args.is_empty() {
                return Err(RuntimeError::at("Folder.get_name() takes no arguments.", pos));
            }
            Ok(Value::string(rc.borrow().name()))
        }
        _ => Err(RuntimeError::at(
            format!("Folder has no method '{}'.", name),
            pos,
        )),
    }
}

/// Live directory scan for plain files.
fn list_files(
    rc: &Rc<RefCell<FolderState>>,
    pos: Position,
    fs: &dyn FileSystem,
) -> Result<Value, RuntimeError> {
    let state = rc.borrow();
    let entries = fs.list_dir(&state.path).map_err(|e| fs_error(e, pos))?;
    let files = entries
        .into_iter()
        .filter(|entry| fs.is_file(entry))
        .map(|path| {
            Value::File(Rc::new(RefCell::new(FileState {
                path,
                parent: Some(rc.clone()),
                deleted: false,
            })))
        })
        .collect();
    Ok(Value::list(Type::File, files))
}

fn list_subfolders(
    rc: &Rc<RefCell<FolderState>>,
    pos: Position,
    fs: &dyn FileSystem,
) -> Result<Value, RuntimeError> {
    let state = rc.borrow();
    let entries = fs.list_dir(&state.path).map_err(|e| fs_error(e, pos))?;
    let folders = entries
        .into_iter()
        .filter(|entry| fs.is_dir(entry))
        .map(|path| {
            Value::Folder(Rc::new(RefCell::new(FolderState {
                path,
                is_root: false,
                deleted: false,
                files: Vec::new(),
            })))
        })
        .collect();
    Ok(Value::list(Type::Folder, folders))
}

/// Audio methods. Returns `None` for unknown names so dispatch can fall
/// back to the File methods.
fn audio_method(
    receiver: &Value,
    name: &str,
    args: &[Value],
    pos: Position,
    fs: &dyn FileSystem,
    audio: &dyn AudioBackend,
) -> Result<Option<Value>, RuntimeError> {
    let Value::Audio(rc) = receiver else {
        return Err(RuntimeError::new("Internal: expected an audio value."));
    };
    match name {
        "cut" => {
            let [Value::Int(start), Value::Int(end)] = args else {
                return Err(RuntimeError::at(
                    "Audio.cut() expects 2 integer arguments (start, end).",
                    pos,
                ));
            };
            check_file_not_deleted(receiver, pos)?;
            let (start_ms, end_ms) = (start.get(), end.get());
            let (path, length, title) = {
                let state = rc.borrow();
                (state.file.path.clone(), state.length_ms, state.title.clone())
            };
            if !(0 <= start_ms && start_ms < end_ms && end_ms <= length) {
                return Err(RuntimeError::at(
                    format!("Invalid cut parameters for audio '{}'.", title),
                    pos,
                ));
            }
            let clip = audio.decode(&path).map_err(|e| audio_error(e, pos))?;
            let trimmed = audio.trim(clip, start_ms, end_ms);
            export_in_place(&trimmed, &path, audio, pos)?;
            rc.borrow_mut().length_ms = end_ms - start_ms;
            Ok(Some(Value::Null))
        }
        "concat" => {
            let [Value::Audio(other)] = args else {
                return Err(RuntimeError::at("Audio.concat() expects 1 Audio argument.", pos));
            };
            check_file_not_deleted(receiver, pos)?;
            let path = rc.borrow().file.path.clone();
            let other_path = other.borrow().file.path.clone();
            let first = audio.decode(&path).map_err(|e| audio_error(e, pos))?;
            let second = audio.decode(&other_path).map_err(|e| audio_error(e, pos))?;
            let joined = audio.concat(first, second);
            export_in_place(&joined, &path, audio, pos)?;
            let added = other.borrow().length_ms;
            rc.borrow_mut().length_ms += added;
            Ok(Some(Value::Null))
        }
        "change_title" => {
            let [Value::Str(new_title)] = args else {
                return Err(RuntimeError::at(
                    "Audio.change_title() expects 1 string argument.",
                    pos,
                ));
            };
            check_file_not_deleted(receiver, pos)?;
            let new_title = new_title.borrow().clone();
            let path = rc.borrow().file.path.clone();
            let mut clip = audio.decode(&path).map_err(|e| audio_error(e, pos))?;
            clip.tags.title = Some(new_title.clone());
            export_in_place(&clip, &path, audio, pos)?;
            rc.borrow_mut().title = new_title;
            Ok(Some(Value::Null))
        }
        "change_format" => {
            let [Value::Str(extension)] = args else {
                return Err(RuntimeError::at(
                    "Audio.change_format() expects 1 string argument.",
                    pos,
                ));
            };
            check_file_not_deleted(receiver, pos)?;
            let extension = extension.borrow().clone();
            let old_path = rc.borrow().file.path.clone();
            let new_path = old_path.with_extension(&extension);
            if new_path == old_path {
                return Ok(Some(Value::Null));
            }
            let clip = audio.decode(&old_path).map_err(|e| audio_error(e, pos))?;
            fs.copy(&old_path, &new_path).map_err(|e| fs_error(e, pos))?;
            audio
                .export(&clip, &new_path, &extension)
                .map_err(|e| audio_error(e, pos))?;
            fs.remove(&old_path).map_err(|e| fs_error(e, pos))?;
            rc.borrow_mut().file.path = new_path;
            Ok(Some(Value::Null))
        }
        "change_volume" => {
            let [Value::Float(db)] = args else {
                return Err(RuntimeError::at(
                    "Audio.change_volume() expects 1 float argument.",
                    pos,
                ));
            };
            check_file_not_deleted(receiver, pos)?;
            let path = rc.borrow().file.path.clone();
            let clip = audio.decode(&path).map_err(|e| audio_error(e, pos))?;
            let adjusted = audio.apply_gain(clip, db.get());
            export_in_place(&adjusted, &path, audio, pos)?;
            Ok(Some(Value::Null))
        }
        _ => Ok(None),
    }
}

fn export_in_place(
    clip: &Clip,
    path: &Path,
    audio: &dyn AudioBackend,
    pos: Position,
) -> Result<(), RuntimeError> {
    let format = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    audio
        .export(clip, path, &format)
        .map_err(|e| audio_error(e, pos))
}
