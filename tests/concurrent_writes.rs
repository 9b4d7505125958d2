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

use std::collections::HashSet;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;
use reopenlog::Append;
use reopenlog::ErrorKind;
use reopenlog::append::FileBuilder;
use reopenlog::append::RotatableFileBuilder;
use tempfile::TempDir;

const THREADS: usize = 8;
const RECORDS_PER_THREAD: usize = 500;

fn generate_random_string() -> String {
    let mut rng = rand::rng();
    let len = rng.random_range(10..=200);
    std::iter::repeat(())
        .map(|()| rng.sample(Alphanumeric))
        .map(char::from)
        .take(len)
        .collect()
}

fn tagged(thread: usize, seq: usize) -> String {
    format!("thread={thread} seq={seq} {}", generate_random_string())
}

fn read_records(path: &Path) -> Vec<String> {
    let content = fs::read_to_string(path).unwrap();
    assert!(content.is_empty() || content.ends_with('\n'));
    content.lines().map(str::to_string).collect()
}

fn write_concurrently(append: Arc<dyn Append>) -> HashSet<String> {
    let handles = (0..THREADS)
        .map(|thread| {
            let append = append.clone();
            thread::spawn(move || {
                let mut written = vec![];
                for seq in 0..RECORDS_PER_THREAD {
                    let record = tagged(thread, seq);
                    append.write(record.as_bytes()).unwrap();
                    written.push(record);
                }
                written
            })
        })
        .collect::<Vec<_>>();

    handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect()
}

#[test]
fn test_concurrent_writes_produce_whole_records() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("concurrent.log");

    // a small buffer forces many implicit flushes in between
    let file = FileBuilder::new(&path)
        .buffer_size(NonZeroUsize::new(256).unwrap())
        .flush_interval(Duration::from_millis(1))
        .build()
        .unwrap();
    let file: Arc<dyn Append> = Arc::new(file);

    let expected = write_concurrently(file.clone());
    file.close().unwrap();

    let records = read_records(&path);
    assert_eq!(records.len(), THREADS * RECORDS_PER_THREAD);
    assert_eq!(records.iter().cloned().collect::<HashSet<_>>(), expected);
}

#[test]
fn test_records_of_one_thread_keep_call_order() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ordered.log");
    let file: Arc<dyn Append> = Arc::new(FileBuilder::new(&path).build().unwrap());

    write_concurrently(file.clone());
    file.close().unwrap();

    let mut next_seq = vec![0; THREADS];
    for record in read_records(&path) {
        let mut fields = record.split(' ');
        let thread = fields.next().unwrap()["thread=".len()..].parse::<usize>().unwrap();
        let seq = fields.next().unwrap()["seq=".len()..].parse::<usize>().unwrap();
        assert_eq!(seq, next_seq[thread]);
        next_seq[thread] += 1;
    }
    assert!(next_seq.iter().all(|&n| n == RECORDS_PER_THREAD));
}

#[test]
fn test_concurrent_writes_across_rotations() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rotating.log");

    let file = RotatableFileBuilder::new(&path)
        .buffer_size(NonZeroUsize::new(512).unwrap())
        .build()
        .unwrap();
    let rotation = file.rotation_handle();
    let file: Arc<dyn Append> = Arc::new(file);

    let rotator = {
        let path = path.clone();
        let dir = temp_dir.path().to_path_buf();
        thread::spawn(move || {
            for i in 0..10 {
                thread::sleep(Duration::from_millis(2));
                fs::rename(&path, dir.join(format!("rotating.log.{i}"))).unwrap();
                rotation.rotate_and_wait().unwrap();
            }
        })
    };

    let expected = write_concurrently(file.clone());
    rotator.join().unwrap();
    file.close().unwrap();

    let mut records = read_records(&path);
    for i in 0..10 {
        records.extend(read_records(&temp_dir.path().join(format!("rotating.log.{i}"))));
    }
    assert_eq!(records.len(), THREADS * RECORDS_PER_THREAD);
    assert_eq!(records.into_iter().collect::<HashSet<_>>(), expected);
}

#[test]
fn test_writes_racing_close_either_land_or_fail_closed() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("racing.log");
    let file: Arc<dyn Append> = Arc::new(FileBuilder::new(&path).build().unwrap());

    let handles = (0..THREADS)
        .map(|thread| {
            let file = file.clone();
            thread::spawn(move || {
                let mut accepted = 0;
                for seq in 0..RECORDS_PER_THREAD {
                    match file.write(tagged(thread, seq).as_bytes()) {
                        Ok(_) => accepted += 1,
                        Err(err) => assert_eq!(err.kind(), ErrorKind::Closed),
                    }
                }
                accepted
            })
        })
        .collect::<Vec<_>>();

    thread::sleep(Duration::from_millis(1));
    file.close().unwrap();

    let accepted = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum::<usize>();
    assert_eq!(read_records(&path).len(), accepted);
}
