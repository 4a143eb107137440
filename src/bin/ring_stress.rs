//! Ring Stress - concurrent producer/consumer verification run
//!
//! Hammers one shared buffer from several producer and consumer threads and
//! then checks:
//! - every produced value was consumed exactly once
//! - each consumer saw each producer's values in production order
//! - occupancy never exceeded capacity (sampled)
//! - the buffer ends empty
//!
//! Usage:
//!   cargo run --release --bin ring_stress -- [OPTIONS]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use intring::{BlockingRingBuffer, BufferError, Value};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Stress run configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "ring_stress", about = "Concurrent ring buffer stress run")]
struct StressConfig {
    /// Buffer capacity
    #[arg(short, long, default_value_t = 64)]
    capacity: usize,

    /// Producer threads
    #[arg(short, long, default_value_t = 4)]
    producers: usize,

    /// Consumer threads
    #[arg(short = 'n', long, default_value_t = 4)]
    consumers: usize,

    /// Values written by each producer
    #[arg(short, long, default_value_t = 100_000)]
    items: usize,

    /// Wait on full/empty instead of spinning with yield
    #[arg(short, long)]
    blocking: bool,

    /// Per-thread progress output
    #[arg(short, long)]
    verbose: bool,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            producers: 4,
            consumers: 4,
            items: 100_000,
            blocking: false,
            verbose: false,
        }
    }
}

impl StressConfig {
    fn total(&self) -> usize {
        self.producers * self.items
    }

    /// Producer `p` owns the value range `[p * items, (p + 1) * items)`.
    fn value_for(&self, producer: usize, i: usize) -> Value {
        (producer * self.items + i) as Value
    }

    fn producer_of(&self, value: Value) -> usize {
        value as usize / self.items
    }
}

/// Run statistics
struct StressStats {
    written: AtomicU64,
    consumed: AtomicUsize,
    full_rejections: AtomicU64,
    empty_rejections: AtomicU64,
    max_occupied: AtomicUsize,
}

impl StressStats {
    fn new() -> Self {
        Self {
            written: AtomicU64::new(0),
            consumed: AtomicUsize::new(0),
            full_rejections: AtomicU64::new(0),
            empty_rejections: AtomicU64::new(0),
            max_occupied: AtomicUsize::new(0),
        }
    }

    fn print_report(&self, config: &StressConfig, duration: Duration) {
        let written = self.written.load(Ordering::Relaxed);
        let consumed = self.consumed.load(Ordering::Relaxed);

        println!("\nSTRESS RUN RESULTS");
        println!("==================");
        println!(
            "  Mode:             {}",
            if config.blocking { "blocking" } else { "fail-fast + yield" }
        );
        println!("  Capacity:         {}", config.capacity);
        println!(
            "  Threads:          {} producers / {} consumers",
            config.producers, config.consumers
        );
        println!("  Duration:         {:.2}s", duration.as_secs_f64());
        println!("  Written:          {}", written);
        println!("  Consumed:         {}", consumed);
        println!(
            "  Full rejections:  {}",
            self.full_rejections.load(Ordering::Relaxed)
        );
        println!(
            "  Empty rejections: {}",
            self.empty_rejections.load(Ordering::Relaxed)
        );
        println!(
            "  Max occupied:     {}",
            self.max_occupied.load(Ordering::Relaxed)
        );
        println!(
            "  Rate:             {:.2} M values/sec",
            consumed as f64 / duration.as_secs_f64() / 1_000_000.0
        );
    }
}

fn run_producer(
    id: usize,
    rb: &BlockingRingBuffer,
    config: &StressConfig,
    stats: &StressStats,
) -> Result<()> {
    for i in 0..config.items {
        let value = config.value_for(id, i);
        if config.blocking {
            rb.write_blocking(value);
        } else {
            loop {
                match rb.try_write(value) {
                    Ok(()) => break,
                    Err(BufferError::Full) => {
                        stats.full_rejections.fetch_add(1, Ordering::Relaxed);
                        thread::yield_now();
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        stats.written.fetch_add(1, Ordering::Relaxed);
    }

    if config.verbose {
        info!(producer = id, items = config.items, "producer finished");
    }
    Ok(())
}

fn run_consumer(
    id: usize,
    rb: &BlockingRingBuffer,
    config: &StressConfig,
    stats: &StressStats,
) -> Result<Vec<Value>> {
    let total = config.total();
    let mut received = Vec::new();

    while stats.consumed.load(Ordering::Acquire) < total {
        let result = if config.blocking {
            rb.read_timeout(Duration::from_millis(10))
        } else {
            rb.try_read()
        };

        match result {
            Ok(value) => {
                received.push(value);
                stats.consumed.fetch_add(1, Ordering::AcqRel);
            }
            Err(BufferError::Empty) => {
                stats.empty_rejections.fetch_add(1, Ordering::Relaxed);
                if !config.blocking {
                    thread::yield_now();
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    if config.verbose {
        info!(consumer = id, received = received.len(), "consumer finished");
    }
    Ok(received)
}

fn verify(config: &StressConfig, stats: &StressStats, per_consumer: &[Vec<Value>]) -> Result<()> {
    let mut seen = HashSet::with_capacity(config.total());

    for (consumer, values) in per_consumer.iter().enumerate() {
        let mut last_from: Vec<Option<Value>> = vec![None; config.producers];

        for &value in values {
            if !seen.insert(value) {
                bail!("value {} consumed twice", value);
            }

            let producer = config.producer_of(value);
            if producer >= config.producers {
                bail!("consumer {} read unknown value {}", consumer, value);
            }
            if let Some(last) = last_from[producer] {
                if value <= last {
                    bail!(
                        "consumer {} saw producer {} out of order: {} after {}",
                        consumer,
                        producer,
                        value,
                        last
                    );
                }
            }
            last_from[producer] = Some(value);
        }
    }

    if seen.len() != config.total() {
        bail!(
            "{} values dropped ({} of {} consumed)",
            config.total() - seen.len(),
            seen.len(),
            config.total()
        );
    }

    let max_occupied = stats.max_occupied.load(Ordering::Relaxed);
    if max_occupied > config.capacity {
        bail!(
            "occupancy {} exceeded capacity {}",
            max_occupied,
            config.capacity
        );
    }

    Ok(())
}

fn run_stress(config: StressConfig) -> Result<()> {
    if config.producers == 0 || config.consumers == 0 || config.items == 0 {
        bail!("producers, consumers and items must all be greater than zero");
    }

    let rb = Arc::new(BlockingRingBuffer::new(config.capacity)?);
    let stats = Arc::new(StressStats::new());
    let config = Arc::new(config);
    let running = Arc::new(AtomicBool::new(true));

    println!(
        "Starting {} producers x {} items, {} consumers, capacity {}...",
        config.producers, config.items, config.consumers, config.capacity
    );

    // Occupancy sampler
    let monitor = {
        let rb = Arc::clone(&rb);
        let stats = Arc::clone(&stats);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                let occupied = rb.buffer().len();
                stats.max_occupied.fetch_max(occupied, Ordering::Relaxed);
                thread::sleep(Duration::from_micros(50));
            }
        })
    };

    let start = Instant::now();

    let producers: Vec<_> = (0..config.producers)
        .map(|id| {
            let rb = Arc::clone(&rb);
            let stats = Arc::clone(&stats);
            let config = Arc::clone(&config);
            thread::spawn(move || run_producer(id, &rb, &config, &stats))
        })
        .collect();

    let consumers: Vec<_> = (0..config.consumers)
        .map(|id| {
            let rb = Arc::clone(&rb);
            let stats = Arc::clone(&stats);
            let config = Arc::clone(&config);
            thread::spawn(move || run_consumer(id, &rb, &config, &stats))
        })
        .collect();

    for handle in producers {
        match handle.join() {
            Ok(result) => result?,
            Err(_) => bail!("producer thread panicked"),
        }
    }

    let mut per_consumer = Vec::with_capacity(config.consumers);
    for handle in consumers {
        match handle.join() {
            Ok(result) => per_consumer.push(result?),
            Err(_) => bail!("consumer thread panicked"),
        }
    }

    let duration = start.elapsed();
    running.store(false, Ordering::Relaxed);
    if monitor.join().is_err() {
        warn!("occupancy sampler panicked");
    }

    stats.print_report(&config, duration);
    debug!(state = %rb.buffer(), "final buffer state");

    verify(&config, &stats, &per_consumer)?;
    if !rb.buffer().is_empty() {
        bail!("buffer not empty after run:\n{}", rb.buffer());
    }

    println!("\nSTRESS RUN PASSED - no duplicates, no drops, FIFO per producer");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    run_stress(StressConfig::parse())
}
