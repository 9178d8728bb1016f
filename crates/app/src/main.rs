//! bitwire-sim: assembles snapshot packets with the bitwire engine and
//! reports what the bit-level compression buys.
//!
//! Each tick the scene advances, a snapshot of every entity is staged into
//! the process-wide packet buffer, and the resulting bytes are decoded
//! again to measure quantization error. The naive baseline is the same
//! data written as machine words (u32 class id, three 12-byte vectors,
//! a length-prefixed name).

mod config;
mod scene;

use bitwire_core::{packet_stream, BitCursor, StaticClassRegistry, STRING_BUFFER_SIZE};
use config::Config;
use scene::{Scene, CLASS_COUNT};

/// Field widths used by the snapshot layout.
const VEL_MAG_BITS: usize = 12;
const DIR_ANGLE_BITS: usize = 10;
const DIR_Z_BITS: usize = 10;
const VEL_MIN: f32 = 0.01;
const VEL_MAX: f32 = 64.0;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };
    if config.print_config {
        config.print();
    }

    let registry = StaticClassRegistry::<1, 1> {
        bit_sizes: [[6]],
        counts: [[CLASS_COUNT]],
    };

    let mut scene = Scene::generate(config.seed, config.entity_count);

    let mut wire_bytes = 0usize;
    let mut naive_bytes = 0usize;
    let mut max_pos_err = 0.0f32;
    let mut max_vel_err = 0.0f32;
    let mut mismatches = 0usize;
    let mut overflows = 0usize;

    for _ in 0..config.snapshots {
        scene.tick(1.0 / 32.0);

        // --- assemble ---
        let payload = {
            let mut stream = packet_stream(0);
            stream.set_compression_point(scene.origin);
            stream.set_string_buffer(Some(Box::new([0u8; STRING_BUFFER_SIZE])));

            stream.write_int(scene.entities.len() as u32, 8);
            for entity in &scene.entities {
                stream.write_class_id(&registry, entity.class_id, 0, 0);
                stream.write_compressed_point(entity.position, config.scale);
                stream.write_vector(
                    entity.velocity,
                    VEL_MIN,
                    VEL_MAX,
                    VEL_MAG_BITS,
                    DIR_ANGLE_BITS,
                    DIR_Z_BITS,
                );
                stream.write_normal_vector_z(entity.facing, DIR_ANGLE_BITS, DIR_Z_BITS);
                stream.write_string(&entity.name, 255);
            }

            if stream.check().is_err() {
                overflows += 1;
                continue;
            }
            stream.buffer()[..stream.position()].to_vec()
        };

        wire_bytes += payload.len();
        naive_bytes += scene
            .entities
            .iter()
            .map(|e| 4 + 12 + 12 + 12 + 1 + e.name.len())
            .sum::<usize>();

        // --- decode and measure ---
        let mut reader = BitCursor::new(&payload[..]);
        reader.set_compression_point(scene.origin);
        reader.set_string_buffer(Some(Box::new([0u8; STRING_BUFFER_SIZE])));

        let count = reader.read_int(8) as usize;
        for entity in scene.entities.iter().take(count) {
            let class_id = reader.read_class_id(&registry, 0, 0);
            let position = reader.read_compressed_point(config.scale);
            let velocity =
                reader.read_vector(VEL_MIN, VEL_MAX, VEL_MAG_BITS, DIR_ANGLE_BITS, DIR_Z_BITS);
            let _facing = reader.read_normal_vector_z(DIR_ANGLE_BITS, DIR_Z_BITS);
            let name = reader.read_string();

            if class_id != Some(entity.class_id) || name != entity.name {
                mismatches += 1;
            }
            max_pos_err = max_pos_err.max((position - entity.position).len());
            max_vel_err = max_vel_err.max((velocity - entity.velocity).len());
        }
        if reader.error() {
            mismatches += 1;
        }
    }

    print_summary(
        &config,
        wire_bytes,
        naive_bytes,
        max_pos_err,
        max_vel_err,
        mismatches,
        overflows,
    );

    if mismatches > 0 {
        std::process::exit(1);
    }
}

fn print_summary(
    config: &Config,
    wire_bytes: usize,
    naive_bytes: usize,
    max_pos_err: f32,
    max_vel_err: f32,
    mismatches: usize,
    overflows: usize,
) {
    let snapshots = config.snapshots.max(1);

    println!("=== Snapshot Compression ===");
    println!("Snapshots: {}", config.snapshots);
    println!("Entities per snapshot: {}", config.entity_count);
    println!(
        "Wire bytes: {} (avg {} per snapshot)",
        wire_bytes,
        wire_bytes / snapshots
    );
    println!("Naive bytes: {}", naive_bytes);
    if naive_bytes > 0 {
        println!(
            "Ratio: {:.1}%",
            wire_bytes as f64 / naive_bytes as f64 * 100.0
        );
    }
    if config.entity_count > 0 && config.snapshots > 0 {
        let bits_per_entity =
            wire_bytes * 8 / (config.entity_count * config.snapshots.max(1));
        println!("Bits per entity: {}", bits_per_entity);
    }
    println!();

    println!("=== Fidelity ===");
    println!(
        "Max position error: {:.4} (quantum {:.4})",
        max_pos_err, config.scale
    );
    println!("Max velocity error: {:.4}", max_vel_err);
    if overflows > 0 {
        println!("Snapshots dropped for overflow: {}", overflows);
    }
    if mismatches == 0 {
        println!("Verification: PASSED (all ids and names exact)");
    } else {
        println!("Verification: FAILED ({} mismatches)", mismatches);
    }
}
