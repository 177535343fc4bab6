// Subcommand implementations.

use anyhow::{bail, ensure, Context, Result};
use picagl_core::gpu::{
    Barrier, Command, CommandQueue, FillTarget, FillWidth, SimulatedGpu, QUEUE_CAPACITY,
};
use picagl_core::memory::{lock_memory, Domain, DomainPtr, MemorySystem};
use picagl_core::texture::{swizzle, Direction, TexelFormat};
use picagl_runtime::ContextConfig;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Convert a raw pixel file with the software swizzle.
pub fn tile_file(
    input: &Path,
    output: &Path,
    width: u32,
    height: u32,
    format: TexelFormat,
    untile: bool,
) -> Result<()> {
    let src = std::fs::read(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let len = format.surface_size(width, height);
    ensure!(
        src.len() >= len,
        "{} holds {} bytes, a {}x{} {} surface needs {}",
        input.display(),
        src.len(),
        width,
        height,
        format,
        len
    );
    if src.len() > len {
        log::warn!("ignoring {} trailing bytes", src.len() - len);
    }

    let direction = if untile {
        Direction::ToLinear
    } else {
        Direction::ToTiled
    };
    let mut dst = vec![0u8; len];
    swizzle(&src, &mut dst, width, height, format.bytes_per_pixel(), direction)
        .context("Conversion failed")?;
    std::fs::write(output, &dst)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("{:?}: {} bytes, {}x{} {}", direction, len, width, height, format);
    Ok(())
}

/// Result of a soak run.
#[derive(Debug, Serialize)]
pub struct SoakReport {
    pub commands: u32,
    pub batches: u32,
    pub latency_us: u64,
    pub elapsed_ms: f64,
    pub commands_per_sec: f64,
    pub fifo_violations: u32,
}

impl SoakReport {
    pub fn print(&self) {
        println!("Soak test complete");
        println!("  commands:        {}", self.commands);
        println!("  batches:         {}", self.batches);
        println!("  latency:         {} us", self.latency_us);
        println!("  elapsed:         {:.2} ms", self.elapsed_ms);
        println!("  throughput:      {:.0} commands/s", self.commands_per_sec);
        println!("  FIFO violations: {}", self.fifo_violations);
    }
}

// Rotates through every command category.
fn soak_command(index: u32, scratch: [DomainPtr; 2]) -> Command {
    match index % 4 {
        0 => Command::process_list(vec![index, 0x000F_0000, 0, 0], index % 8 == 0),
        1 => Command::MemoryFill {
            target: FillTarget::Primary,
            buffer: scratch[0],
            len: 256,
            value: index,
            width: FillWidth::Bits32,
        },
        2 => Command::MemoryFill {
            target: FillTarget::Secondary,
            buffer: scratch[1],
            len: 256,
            value: index,
            width: FillWidth::Bits16,
        },
        _ => Command::TextureCopy {
            src: scratch[0],
            dst: scratch[1],
            len: 256,
        },
    }
}

/// Push `count` commands through a simulated GPU, at most a full queue at a
/// time, and verify callbacks fire in submission order.
pub fn soak(config: &ContextConfig, count: u32, mut progress: impl FnMut(u64)) -> Result<SoakReport> {
    let memory = MemorySystem::new(&config.memory).into_shared();
    let scratch = {
        let mut memory = lock_memory(&memory);
        let a = memory.alloc(Domain::Linear, 256);
        let b = memory.alloc(Domain::Linear, 256);
        match (a, b) {
            (Some(a), Some(b)) => [a, b],
            _ => bail!("linear memory too small for the soak buffers"),
        }
    };

    let gpu = SimulatedGpu::spawn(Some(Arc::clone(&memory)), config.gpu_latency());
    let queue = CommandQueue::new(gpu.clone());
    gpu.attach(&queue);

    let order = Arc::new(Mutex::new(Vec::with_capacity(count as usize)));
    let started = Instant::now();
    let mut batches = 0;
    let mut submitted = 0;

    while submitted < count {
        let barrier = Barrier::shared();
        let batch_end = count.min(submitted + QUEUE_CAPACITY as u32);
        for index in submitted..batch_end {
            let order = Arc::clone(&order);
            queue.submit_async(
                soak_command(index, scratch),
                Some(Box::new(move || {
                    if let Ok(mut order) = order.lock() {
                        order.push(index);
                    }
                })),
                Some(Arc::clone(&barrier)),
            );
        }
        barrier.wait();
        submitted = batch_end;
        batches += 1;
        progress(u64::from(submitted));
    }
    // Callbacks run after the barrier is released; a synchronous command
    // completes only once the last of them has returned.
    queue.submit_sync(Command::process_list(vec![0u32; 4], false));
    let elapsed = started.elapsed();

    let order = order
        .lock()
        .map_err(|_| anyhow::anyhow!("completion log poisoned"))?;
    ensure!(
        order.len() == count as usize,
        "{} of {} callbacks ran",
        order.len(),
        count
    );
    let fifo_violations = order
        .iter()
        .enumerate()
        .filter(|&(i, &index)| i as u32 != index)
        .count() as u32;
    if fifo_violations > 0 {
        log::error!("{} commands completed out of order", fifo_violations);
    }

    let secs = elapsed.as_secs_f64();
    Ok(SoakReport {
        commands: count,
        batches,
        latency_us: config.gpu_latency_us,
        elapsed_ms: secs * 1000.0,
        commands_per_sec: if secs > 0.0 { f64::from(count) / secs } else { 0.0 },
        fifo_violations,
    })
}
