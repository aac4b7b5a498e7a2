//! Integration tests for the command history over real files.
//!
//! These tests verify end-to-end undo/redo behavior including:
//! - Undo-all then redo-all restoring the filesystem
//! - Best-effort batches with destination collisions
//! - Depth limits and failed undos

use assert_fs::prelude::*;
use picture_sorter::core::history::CommandHistory;
use picture_sorter::core::operations::{
    BatchOperation, BatchSummary, CopyOperation, DeleteOperation, MoveOperation, RotateOperation,
};
use picture_sorter::error::{HistoryError, OperationErrorKind};
use picture_sorter::events::{Event, EventChannel, HistoryEvent};
use predicates::prelude::*;
use std::fs;

#[test]
fn undo_all_redo_all_restores_filesystem() {
    let photos = assert_fs::TempDir::new().unwrap();
    let sorted = assert_fs::TempDir::new().unwrap();
    let a = photos.child("a.jpg");
    let b = photos.child("b.jpg");
    let c = photos.child("c.jpg");
    a.write_str("photo a").unwrap();
    b.write_str("photo b").unwrap();
    c.write_str("photo c").unwrap();

    let mut history = CommandHistory::new();
    history
        .execute(Box::new(CopyOperation::new(a.path(), sorted.path())))
        .unwrap();
    history
        .execute(Box::new(MoveOperation::new(b.path(), sorted.path())))
        .unwrap();
    history.execute(Box::new(DeleteOperation::new(c.path()))).unwrap();

    sorted.child("a.jpg").assert("photo a");
    sorted.child("b.jpg").assert("photo b");
    b.assert(predicate::path::missing());
    c.assert(predicate::path::missing());

    while history.can_undo() {
        history.undo().unwrap();
    }

    a.assert("photo a");
    b.assert("photo b");
    c.assert("photo c");
    sorted.child("a.jpg").assert(predicate::path::missing());
    sorted.child("b.jpg").assert(predicate::path::missing());

    while history.can_redo() {
        history.redo().unwrap();
    }

    sorted.child("a.jpg").assert("photo a");
    sorted.child("b.jpg").assert("photo b");
    c.assert(predicate::path::missing());
    assert_eq!(history.undo_description(), Some("Delete c.jpg"));
    assert_eq!(history.undo_len(), 3);
}

#[test]
fn batch_copy_skips_existing_and_undoes_exactly_what_it_copied() {
    let photos = assert_fs::TempDir::new().unwrap();
    let sorted = assert_fs::TempDir::new().unwrap();
    let sources: Vec<_> = (1..=5)
        .map(|i| {
            let child = photos.child(format!("img{}.jpg", i));
            child.write_str(&format!("new {}", i)).unwrap();
            child.path().to_path_buf()
        })
        .collect();
    sorted.child("img2.jpg").write_str("kept 2").unwrap();
    sorted.child("img5.jpg").write_str("kept 5").unwrap();

    let mut history = CommandHistory::new();
    let report = history
        .execute(Box::new(BatchOperation::copy_all(sources, sorted.path())))
        .unwrap();

    assert_eq!(
        report.summary,
        Some(BatchSummary {
            succeeded: 3,
            skipped: 2,
            errored: 0
        })
    );
    assert_eq!(report.affected_paths.len(), 3);
    sorted.child("img1.jpg").assert("new 1");
    sorted.child("img2.jpg").assert("kept 2");

    history.undo().unwrap();

    for name in ["img1.jpg", "img3.jpg", "img4.jpg"] {
        sorted.child(name).assert(predicate::path::missing());
    }
    sorted.child("img2.jpg").assert("kept 2");
    sorted.child("img5.jpg").assert("kept 5");

    history.redo().unwrap();
    sorted.child("img3.jpg").assert("new 3");
    sorted.child("img5.jpg").assert("kept 5");
}

#[test]
fn batch_with_no_successes_is_not_recorded() {
    let photos = assert_fs::TempDir::new().unwrap();
    let sorted = assert_fs::TempDir::new().unwrap();
    let a = photos.child("a.jpg");
    a.write_str("mine").unwrap();
    sorted.child("a.jpg").write_str("theirs").unwrap();

    let mut history = CommandHistory::new();
    let err = history
        .execute(Box::new(BatchOperation::move_all(vec![a.path()], sorted.path())))
        .unwrap_err();

    assert_eq!(
        err.operation_error().map(|e| e.kind()),
        Some(OperationErrorKind::BatchFailed)
    );
    assert!(!history.can_undo());
    a.assert("mine");
}

#[test]
fn depth_two_keeps_latest_two() {
    let photos = assert_fs::TempDir::new().unwrap();
    let sorted = assert_fs::TempDir::new().unwrap();
    let mut history = CommandHistory::builder().max_depth(2).build();

    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        let child = photos.child(name);
        child.write_str(name).unwrap();
        history
            .execute(Box::new(CopyOperation::new(child.path(), sorted.path())))
            .unwrap();
    }

    assert_eq!(history.undo_len(), 2);
    history.undo().unwrap();
    history.undo().unwrap();
    assert!(matches!(history.undo(), Err(HistoryError::NothingToUndo)));

    // The dropped copy of a.jpg stays in place
    sorted.child("a.jpg").assert("a.jpg");
    sorted.child("b.jpg").assert(predicate::path::missing());
}

#[test]
fn undo_of_vanished_move_is_pushed_back() {
    let photos = assert_fs::TempDir::new().unwrap();
    let sorted = assert_fs::TempDir::new().unwrap();
    let a = photos.child("a.jpg");
    a.write_str("photo").unwrap();

    let (sender, receiver) = EventChannel::new();
    let mut history = CommandHistory::builder().events(sender).build();
    history
        .execute(Box::new(MoveOperation::new(a.path(), sorted.path())))
        .unwrap();
    fs::remove_file(sorted.child("a.jpg").path()).unwrap();

    let err = history.undo().unwrap_err();

    assert!(matches!(err, HistoryError::Undo { .. }));
    assert!(history.can_undo());
    assert!(!history.can_redo());
    assert_eq!(history.undo_description(), Some("Move a.jpg"));

    let failed = std::iter::from_fn(|| receiver.try_recv()).any(|event| {
        matches!(event, Event::History(HistoryEvent::Failed { ref description, .. }) if description == "Move a.jpg")
    });
    assert!(failed);
}

#[test]
fn new_execute_after_undo_drops_redo() {
    let photos = assert_fs::TempDir::new().unwrap();
    let sorted = assert_fs::TempDir::new().unwrap();
    let a = photos.child("a.jpg");
    let b = photos.child("b.jpg");
    a.write_str("a").unwrap();
    b.write_str("b").unwrap();

    let mut history = CommandHistory::new();
    history
        .execute(Box::new(CopyOperation::new(a.path(), sorted.path())))
        .unwrap();
    history.undo().unwrap();
    assert!(history.can_redo());

    history
        .execute(Box::new(CopyOperation::new(b.path(), sorted.path())))
        .unwrap();

    assert!(!history.can_redo());
    assert!(matches!(history.redo(), Err(HistoryError::NothingToRedo)));
}

#[test]
fn delete_undo_is_byte_identical() {
    let photos = assert_fs::TempDir::new().unwrap();
    let bytes: Vec<u8> = (0..50_000u32).map(|i| (i * 31 % 251) as u8).collect();
    let file = photos.child("raw.bmp");
    file.write_binary(&bytes).unwrap();

    let mut history = CommandHistory::new();
    history.execute(Box::new(DeleteOperation::new(file.path()))).unwrap();
    file.assert(predicate::path::missing());

    history.undo().unwrap();

    assert_eq!(fs::read(file.path()).unwrap(), bytes);
}

#[test]
fn rotate_and_undo_restores_dimensions() {
    let photos = assert_fs::TempDir::new().unwrap();
    let file = photos.child("wide.png");
    image::RgbImage::from_pixel(6, 2, image::Rgb([10, 200, 30]))
        .save(file.path())
        .unwrap();

    let mut history = CommandHistory::new();
    history
        .execute(Box::new(RotateOperation::new(file.path(), 90).unwrap()))
        .unwrap();
    assert_eq!(image::image_dimensions(file.path()).unwrap(), (2, 6));

    history.undo().unwrap();
    assert_eq!(image::image_dimensions(file.path()).unwrap(), (6, 2));

    history.redo().unwrap();
    assert_eq!(image::image_dimensions(file.path()).unwrap(), (2, 6));
}
