//! Async launches through the tokio blocking pool.

mod common;

use std::sync::Arc;

use common::{random_f32, random_i32, tracking_runtime};
use ringstencil::prelude::*;

type Stencil = BoxStencil<Rect<-1, -2, 1, 2>, Group<8, 4>>;

#[tokio::test]
async fn test_run_async_matches_reference() {
    let stencil = Stencil::new(tracking_runtime());
    let grid = Arc::new(random_f32(31, 19, 1));
    let expected = stencil.reference(&grid);

    for variant in Variant::catalogue() {
        let out = stencil
            .run_async(variant, Arc::clone(&grid))
            .await
            .expect("Failed to run stencil");
        assert_eq!(out, expected, "{variant}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_launches_share_runtime() {
    let stencil = Arc::new(Stencil::new(tracking_runtime()));
    let grid = Arc::new(random_i32(40, 25, 2));
    let expected = stencil.reference(&grid);

    let mut handles = Vec::new();
    for variant in Variant::catalogue() {
        let stencil = Arc::clone(&stencil);
        let grid = Arc::clone(&grid);
        handles.push(tokio::spawn(async move {
            (variant, stencil.run_async(variant, grid).await)
        }));
    }

    for handle in handles {
        let (variant, result) = handle.await.expect("Failed to join launch task");
        assert_eq!(result.expect("Failed to run stencil"), expected, "{variant}");
    }

    let metrics = stencil.runtime().metrics();
    assert_eq!(metrics.total_launches, Variant::catalogue().len() as u64);
    assert_eq!(metrics.failed_launches, 0);
}

#[tokio::test]
async fn test_shutdown_rejects_launches() {
    let stencil = Stencil::new(tracking_runtime());
    let grid = Arc::new(random_i32(8, 8, 3));

    stencil.runtime().shutdown();
    let result = stencil.run_async(Variant::BigTileCube, grid).await;
    assert_eq!(result, Err(StencilError::RuntimeShutdown));
}
