//! Example: Load and inspect a skeleton script.
//!
//! Run with: cargo run --example load_skeleton -- leg.txt

use std::env;

use rig_core::{Scene, SkeletonFile};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: load_skeleton <path-to-skeleton-script>");
        return;
    }

    let path = &args[1];
    let file = match SkeletonFile::load(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let mut scene = Scene::new(path.as_str());
    if let Err(e) = scene.load_skeleton(&file) {
        eprintln!("Failed to build skeleton: {}", e);
        std::process::exit(1);
    }

    println!("=== Skeleton: {} ({} joints) ===", path, file.joints.len());
    for id in scene.graph.depth_first() {
        let Ok(node) = scene.graph.node(id) else { continue };
        if !node.is_joint() {
            continue;
        }
        let depth = std::iter::successors(node.parent(), |p| scene.graph.parent(*p).ok().flatten()).count();
        let pos = scene.graph.world_position(id).unwrap_or_default();
        println!(
            "{}{} at ({:.2}, {:.2}, {:.2})",
            "  ".repeat(depth),
            node.name,
            pos.x,
            pos.y,
            pos.z
        );
    }
}
