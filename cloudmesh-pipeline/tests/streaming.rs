//! Chunked delivery and cancellation behavior over large point sets.

use cloudmesh_core::{GlobalTransform, Point3f};
use cloudmesh_pipeline::stream::{
    self, PipelineEvent, PipelineState, CHUNK_SIZE, FIRST_CHUNK_SIZE, STREAMING_THRESHOLD,
};

/// 250k points on a planar grid, tagged by which half they fall in.
fn large_cloud() -> (Vec<Point3f>, Vec<u32>) {
    let n = 250_000;
    assert!(n > STREAMING_THRESHOLD);
    let points: Vec<Point3f> = (0..n)
        .map(|i| Point3f::new((i % 500) as f32, (i / 500) as f32, 0.0))
        .collect();
    let tags: Vec<u32> = (0..n).map(|i| if i < n / 2 { 0 } else { 1 }).collect();
    (points, tags)
}

#[test]
fn test_chunked_delivery_sizes_and_order() {
    let (points, tags) = large_cloud();
    let total = points.len();
    let expected_batches = 1 + (total - FIRST_CHUNK_SIZE).div_ceil(CHUNK_SIZE);

    // Level 0 requests no reduction, so batch math is exact.
    let run = stream::start(points.clone(), tags.clone(), GlobalTransform::identity(), 0);

    let mut batches = Vec::new();
    let mut states = Vec::new();
    let mut completed_total = None;
    while let Some(event) = run.next_event() {
        match event {
            PipelineEvent::Batch(b) => batches.push(b),
            PipelineEvent::StateChanged(s) => states.push(s),
            PipelineEvent::Complete { total_points } => completed_total = Some(total_points),
            PipelineEvent::Cancelled => panic!("unexpected cancellation"),
        }
    }

    assert_eq!(completed_total, Some(total));
    assert_eq!(batches.len(), expected_batches);
    assert_eq!(batches[0].len(), FIRST_CHUNK_SIZE);
    assert_eq!(batches[0].offset, 0);
    for b in &batches[1..batches.len() - 1] {
        assert_eq!(b.len(), CHUNK_SIZE);
    }
    let last = batches.last().unwrap();
    assert_eq!(last.len(), (total - FIRST_CHUNK_SIZE) % CHUNK_SIZE);
    assert_eq!(last.offset + last.len(), total);

    // Offsets are contiguous and contents line up with the source order.
    let mut expected_offset = 0;
    for b in &batches {
        assert_eq!(b.offset, expected_offset);
        assert_eq!(b.positions[0], points[b.offset]);
        assert_eq!(b.provenance, &tags[b.offset..b.offset + b.len()]);
        expected_offset += b.len();
    }
    assert_eq!(expected_offset, total);

    assert_eq!(
        states,
        vec![
            PipelineState::TransformComputing,
            PipelineState::Downsampling,
            PipelineState::FirstChunkReady,
            PipelineState::StreamingChunks,
            PipelineState::Complete,
        ]
    );
}

#[test]
fn test_cancel_mid_stream_stops_delivery() {
    let (points, tags) = large_cloud();
    let run = stream::start(points.clone(), tags, GlobalTransform::identity(), 0);

    // Take the first chunk plus two streamed batches, then cancel. The
    // pause stands in for a consumer that spends time on each batch
    // before deciding to cancel; no batch may slip through the gap.
    let mut delivered = Vec::new();
    while delivered.len() < 3 {
        match run.next_event().expect("worker ended early") {
            PipelineEvent::Batch(b) => delivered.push(b),
            PipelineEvent::StateChanged(_) => {}
            other => panic!("unexpected event before cancel: {other:?}"),
        }
    }
    std::thread::sleep(std::time::Duration::from_millis(25));
    run.cancel();

    let mut saw_cancelled_event = false;
    let mut saw_cancelled_state = false;
    while let Some(event) = run.next_event() {
        match event {
            PipelineEvent::Batch(_) => panic!("batch delivered after cancellation"),
            PipelineEvent::StateChanged(PipelineState::Cancelled) => saw_cancelled_state = true,
            PipelineEvent::StateChanged(s) => panic!("unexpected state after cancel: {s:?}"),
            PipelineEvent::Complete { .. } => panic!("run completed despite cancellation"),
            PipelineEvent::Cancelled => saw_cancelled_event = true,
        }
    }
    assert!(saw_cancelled_state);
    assert!(saw_cancelled_event);

    // Batches received before the cancel are unaffected.
    assert_eq!(delivered[0].len(), FIRST_CHUNK_SIZE);
    assert_eq!(delivered[1].len(), CHUNK_SIZE);
    assert_eq!(delivered[2].len(), CHUNK_SIZE);
    for b in &delivered {
        assert_eq!(b.positions[0], points[b.offset]);
    }
}
