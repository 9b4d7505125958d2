// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reopenlog::Append;
use reopenlog::append::RotatableFile;
use reopenlog::append::RotatableFileBuilder;
use reopenlog::record::Level;
use tempfile::TempDir;

fn wait_for_content(path: &std::path::Path, expected: &str) -> String {
    let mut content = String::new();
    for _ in 0..200 {
        content = fs::read_to_string(path).unwrap_or_default();
        if content == expected {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    content
}

#[test]
fn test_rotate_write_close() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("appender_file_rotatable");
    let backup = temp_dir.path().join("appender_file_rotatable_bk");

    let file = RotatableFile::open(&path).unwrap();
    file.write(b"test1").unwrap();

    fs::rename(&path, &backup).unwrap();
    file.rotation_handle().rotate().unwrap();
    // fire-and-forget rotation: the old file receives `test1` once the swap has happened
    assert_eq!(wait_for_content(&backup, "test1\n"), "test1\n");

    file.write(b"test2").unwrap();
    file.close().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "test2\n");
    assert_eq!(fs::read_to_string(&backup).unwrap(), "test1\n");
}

#[test]
fn test_independent_instances_rotate_independently() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.log");
    let b = temp_dir.path().join("b.log");

    let file_a = RotatableFile::open(&a).unwrap();
    let file_b = RotatableFile::open(&b).unwrap();
    file_a.write(b"a1").unwrap();
    file_b.write(b"b1").unwrap();

    fs::rename(&a, temp_dir.path().join("a.log.1")).unwrap();
    file_a.rotation_handle().rotate_and_wait().unwrap();

    file_a.write(b"a2").unwrap();
    file_b.write(b"b2").unwrap();
    file_a.close().unwrap();
    file_b.close().unwrap();

    assert_eq!(fs::read_to_string(temp_dir.path().join("a.log.1")).unwrap(), "a1\n");
    assert_eq!(fs::read_to_string(&a).unwrap(), "a2\n");
    assert_eq!(fs::read_to_string(&b).unwrap(), "b1\nb2\n");
}

#[test]
fn test_periodic_flush_survives_rotation() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("periodic.log");

    let file = RotatableFileBuilder::new(&path)
        .flush_interval(Duration::from_millis(20))
        .build()
        .unwrap();

    file.write(b"before").unwrap();
    assert_eq!(wait_for_content(&path, "before\n"), "before\n");

    fs::rename(&path, temp_dir.path().join("periodic.log.1")).unwrap();
    file.rotation_handle().rotate_and_wait().unwrap();

    file.write(b"after").unwrap();
    assert_eq!(wait_for_content(&path, "after\n"), "after\n");
    file.close().unwrap();
}

#[test]
fn test_drop_flushes_and_stops_listener() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dropped.log");

    let file = RotatableFile::open(&path).unwrap();
    let rotation = file.rotation_handle();
    file.write(b"flushed on drop").unwrap();
    drop(file);

    assert_eq!(fs::read_to_string(&path).unwrap(), "flushed on drop\n");
    assert!(rotation.rotate().is_err());
}

#[test]
fn test_logger_over_rotatable_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("logger.log");

    let file = RotatableFile::open(&path).unwrap();
    let rotation = file.rotation_handle();
    let file: Arc<dyn Append> = Arc::new(file);

    let logger = reopenlog::builder("app")
        .level(Level::Info)
        .append_shared(file.clone())
        .disable_metadata()
        .build();

    logger.info(format_args!("record {}", 1));
    logger.debug(format_args!("filtered"));
    fs::rename(&path, temp_dir.path().join("logger.log.1")).unwrap();
    rotation.rotate_and_wait().unwrap();
    logger.error(format_args!("record {}", 2));
    logger.close();

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("logger.log.1")).unwrap(),
        "record 1\n"
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), "record 2\n");
    assert!(file.write(b"late").is_err());
}
