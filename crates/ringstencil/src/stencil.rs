//! High-level entry point: run any variant over a grid.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use ringstencil_core::error::{Result, StencilError};
use ringstencil_core::{
    Element, GridBuffer, GridView, GroupContext, GroupShape, OutputGrid, OutputView,
    SharedScratch, Window,
};
use ringstencil_cpu::{CpuRuntime, LaunchStats};
use ringstencil_kernels::consumer::{CubeConsumer, FlatConsumer};
use ringstencil_kernels::direct::{self, Addressing};
use ringstencil_kernels::loader::{AddCarryLoader, CubeLoader, DivRemLoader, ShiftedAddCarryLoader};
use ringstencil_kernels::tile::StripShape;
use ringstencil_kernels::{big_tile, sliding, strip, virtual_grid};

use crate::plan::LaunchPlan;
use crate::variant::Variant;

/// Box stencil with window `W` computed by groups of shape `G`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ringstencil::prelude::*;
///
/// let runtime = Arc::new(CpuRuntime::new(RuntimeConfig::new()).unwrap());
/// let stencil = BoxStencil::<Rect<-1, -1, 1, 1>, Group<4, 4>>::new(runtime);
///
/// let grid = GridBuffer::from_fn(5, 5, |x, y| (y * 5 + x) as i32).unwrap();
/// let out = stencil.run(Variant::BigTileAddCarry, &grid).unwrap();
/// assert_eq!(out[0], 2);
/// assert_eq!(out[12], 12);
/// ```
pub struct BoxStencil<W, G> {
    runtime: Arc<CpuRuntime>,
    _shape: PhantomData<fn() -> (W, G)>,
}

impl<W: Window, G: GroupShape> BoxStencil<W, G> {
    /// Stencil executing on `runtime`.
    pub fn new(runtime: Arc<CpuRuntime>) -> Self {
        Self {
            runtime,
            _shape: PhantomData,
        }
    }

    /// The executing runtime.
    pub fn runtime(&self) -> &Arc<CpuRuntime> {
        &self.runtime
    }

    /// Validated geometry of `variant` for `grid`.
    pub fn plan<T: Element>(&self, variant: Variant, grid: &GridBuffer<T>) -> Result<LaunchPlan> {
        LaunchPlan::for_variant::<W, G>(variant, grid.lens())
    }

    /// Compute the stencil of `grid` with `variant`.
    ///
    /// With write tracking enabled on the runtime, the run also fails if any
    /// output element was not written exactly once.
    pub fn run<T: Element>(&self, variant: Variant, grid: &GridBuffer<T>) -> Result<Vec<T>> {
        let output = self.new_output(grid)?;
        self.run_into(variant, grid, &output)?;
        check_partition(variant, &output)?;
        Ok(output.into_vec())
    }

    /// Compute the stencil of `grid` into a caller-provided `output`.
    pub fn run_into<T: Element>(
        &self,
        variant: Variant,
        grid: &GridBuffer<T>,
        output: &OutputGrid<T>,
    ) -> Result<LaunchStats> {
        check_lens(grid, output)?;
        let plan = self.plan(variant, grid)?;
        debug!(
            "Running {} over {}x{} ({} groups)",
            variant,
            plan.lens.x,
            plan.lens.y,
            plan.groups()
        );

        self.runtime
            .launch::<T, _>(&plan.launch_config(), |ctx, scratch| {
                execute::<T, W, G, _, _>(&plan, ctx, scratch, grid, output)
            })
    }

    /// [`BoxStencil::run`] for async callers; the launch runs on tokio's
    /// blocking pool.
    pub async fn run_async<T: Element>(
        &self,
        variant: Variant,
        grid: Arc<GridBuffer<T>>,
    ) -> Result<Vec<T>> {
        let output = Arc::new(self.new_output(&grid)?);
        let plan = self.plan(variant, &grid)?;
        debug!("Running {} asynchronously ({} groups)", variant, plan.groups());

        let kernel_output = Arc::clone(&output);
        self.runtime
            .launch_async::<T, _>(plan.launch_config(), move |ctx, scratch| {
                execute::<T, W, G, _, _>(&plan, ctx, scratch, grid.as_ref(), kernel_output.as_ref())
            })
            .await?;

        let output = Arc::try_unwrap(output)
            .map_err(|_| StencilError::launch("output grid still referenced after launch"))?;
        check_partition(variant, &output)?;
        Ok(output.into_vec())
    }

    /// Sequential reference result, row-major.
    pub fn reference<T: Element>(&self, grid: &GridBuffer<T>) -> Vec<T> {
        direct::reference::<T, W, _>(grid)
    }

    fn new_output<T: Element>(&self, grid: &GridBuffer<T>) -> Result<OutputGrid<T>> {
        if self.runtime.config().track_writes {
            OutputGrid::with_write_tracking(grid.lens())
        } else {
            OutputGrid::new(grid.lens())
        }
    }
}

impl<W, G> std::fmt::Debug for BoxStencil<W, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxStencil")
            .field("window", &std::any::type_name::<W>())
            .field("group", &std::any::type_name::<G>())
            .finish()
    }
}

/// Per-lane dispatch from a plan to its kernel.
fn execute<T, W, G, I, O>(
    plan: &LaunchPlan,
    ctx: &GroupContext<'_>,
    scratch: &SharedScratch<T>,
    input: &I,
    output: &O,
) where
    T: Element,
    W: Window,
    G: GroupShape,
    I: GridView<T> + ?Sized,
    O: OutputView<T> + ?Sized,
{
    let covering = plan.covering;
    match plan.variant {
        Variant::DirectMultiDim => {
            direct::direct::<T, W, G, I, O>(ctx, Addressing::MultiDim, covering, input, output)
        }
        Variant::DirectSingleDim => {
            direct::direct::<T, W, G, I, O>(ctx, Addressing::SingleDim, covering, input, output)
        }
        Variant::BigTileDivRem => big_tile::big_tile::<T, W, G, DivRemLoader, FlatConsumer, I, O>(
            ctx, scratch, covering, input, output,
        ),
        Variant::BigTileAddCarry => {
            big_tile::big_tile::<T, W, G, AddCarryLoader, FlatConsumer, I, O>(
                ctx, scratch, covering, input, output,
            )
        }
        Variant::BigTileCube => big_tile::big_tile::<T, W, G, CubeLoader, CubeConsumer, I, O>(
            ctx, scratch, covering, input, output,
        ),
        Variant::Strip { strip_x, strip_y } => {
            strip::strip::<T, W, G, ShiftedAddCarryLoader, FlatConsumer, I, O>(
                ctx,
                scratch,
                StripShape::new(strip_x, strip_y),
                covering,
                input,
                output,
            )
        }
        Variant::SlidingFlat { windows_y, axis } => sliding::sliding_flat_along::<T, W, G, I, O>(
            ctx, scratch, axis, windows_y, covering, input, output,
        ),
        Variant::SlidingPow2 { windows_y } => sliding::sliding_pow2::<T, W, G, I, O>(
            ctx, scratch, windows_y, covering, input, output,
        ),
        Variant::VirtualBigTile { .. } => {
            virtual_grid::virtual_big_tile::<T, W, G, AddCarryLoader, FlatConsumer, I, O>(
                ctx, scratch, covering, input, output,
            )
        }
        Variant::VirtualStrip {
            strip_x, strip_y, ..
        } => virtual_grid::virtual_strip::<T, W, G, AddCarryLoader, FlatConsumer, I, O>(
            ctx,
            scratch,
            StripShape::new(strip_x, strip_y),
            covering,
            input,
            output,
        ),
    }
}

fn check_lens<T: Element>(grid: &GridBuffer<T>, output: &OutputGrid<T>) -> Result<()> {
    let (input, out) = (grid.lens(), OutputView::<T>::lens(output));
    if input.flat_len() != out.flat_len() {
        return Err(StencilError::BufferSizeMismatch {
            expected: input.flat_len() as usize,
            actual: out.flat_len() as usize,
        });
    }
    if input != out {
        return Err(StencilError::geometry(format!(
            "output is {}x{} but input is {}x{}",
            out.x, out.y, input.x, input.y
        )));
    }
    Ok(())
}

/// Fail unless every element was written exactly once (tracked outputs only).
fn check_partition<T: Element>(variant: Variant, output: &OutputGrid<T>) -> Result<()> {
    let Some(counts) = output.write_counts() else {
        return Ok(());
    };
    let lens = OutputView::<T>::lens(output);
    match counts.iter().position(|&n| n != 1) {
        None => Ok(()),
        Some(index) => {
            let x = index as i64 % lens.x;
            let y = index as i64 / lens.x;
            Err(StencilError::geometry(format!(
                "{} wrote element ({}, {}) {} times",
                variant, x, y, counts[index]
            )))
        }
    }
}
