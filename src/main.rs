//! intring - latency benchmark runner
//!
//! Measures the uncontended cost of each buffer operation and prints the
//! state dump of a small buffer.
//!
//! Usage:
//!   cargo run --release -- [--iterations N] [--capacity N]

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use intring::{BufferError, RingBuffer, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "intring", about = "Ring buffer latency benchmarks")]
struct Args {
    /// Operations per benchmark
    #[arg(long, default_value_t = 1_000_000)]
    iterations: usize,

    /// Buffer capacity used by the benchmarks
    #[arg(long, default_value_t = 65_536)]
    capacity: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    println!("intring - Ring Buffer Benchmarks");
    println!("================================\n");

    benchmark_write_read(&args)?;
    benchmark_drain(&args)?;
    show_state_dump()?;

    println!("\nAll benchmarks complete.");
    println!("For the concurrent stress run: cargo run --release --bin ring_stress");
    Ok(())
}

fn ns_per_op(duration: Duration, ops: usize) -> f64 {
    duration.as_nanos() as f64 / ops as f64
}

fn benchmark_write_read(args: &Args) -> Result<()> {
    println!("Write/Read (uncontended, single thread)");
    println!("---------------------------------------");

    let rb = RingBuffer::new(args.capacity)?;

    // Warm up
    for i in 0..args.capacity.min(1000) {
        rb.write(i as Value)?;
    }
    rb.drain();

    let start = Instant::now();
    for i in 0..args.iterations {
        if let Err(BufferError::Full) = rb.write(i as Value) {
            rb.read()?;
            rb.write(i as Value)?;
        }
    }
    let write_duration = start.elapsed();

    rb.drain();
    for i in 0..args.capacity {
        rb.write(i as Value)?;
    }

    let start = Instant::now();
    for _ in 0..args.iterations {
        let v = rb.read()?;
        rb.write(v)?;
    }
    let cycle_duration = start.elapsed();

    let write_ns = ns_per_op(write_duration, args.iterations);
    let cycle_ns = ns_per_op(cycle_duration, args.iterations);

    println!("  Capacity:     {}", args.capacity);
    println!("  Operations:   {}", args.iterations);
    println!("  Write latency:      {:.2} ns/op", write_ns);
    println!("  Read+write latency: {:.2} ns/op", cycle_ns);
    println!(
        "  Throughput:   {:.2} M writes/sec\n",
        args.iterations as f64 / write_duration.as_secs_f64() / 1_000_000.0
    );
    Ok(())
}

fn benchmark_drain(args: &Args) -> Result<()> {
    println!("Drain (full buffer)");
    println!("-------------------");

    const ROUNDS: usize = 100;
    let rb = RingBuffer::new(args.capacity)?;
    let mut total = Duration::ZERO;
    let mut drained = 0usize;

    for _ in 0..ROUNDS {
        for i in 0..args.capacity {
            rb.write(i as Value)?;
        }
        let start = Instant::now();
        drained += rb.drain().len();
        total += start.elapsed();
    }

    println!("  Rounds:       {}", ROUNDS);
    println!("  Values:       {}", drained);
    println!("  Per value:    {:.2} ns", ns_per_op(total, drained));
    println!(
        "  Per drain:    {:.2} us\n",
        total.as_secs_f64() * 1_000_000.0 / ROUNDS as f64
    );
    Ok(())
}

fn show_state_dump() -> Result<()> {
    println!("State dump (capacity 4, two reads after four writes, one more write)");
    println!("--------------------------------------------------------------------");

    let rb = RingBuffer::new(4)?;
    for v in [10, 20, 30, 40] {
        rb.write(v)?;
    }
    rb.read()?;
    rb.read()?;
    rb.write(50)?;

    println!("{}", rb);
    Ok(())
}
