//! Check command implementation.
//!
//! Validates /proc accessibility and configuration.

use herakles_container_census::process::collect_proc_entries;
use herakles_container_census::{ProcFs, ProcessTable, Strategy};

use crate::config::{validate_effective_config, Config};

/// Validates system requirements and configuration.
pub fn command_check(proc: bool, all: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Container Census - System Check");
    println!("============================================");

    let mut all_ok = true;
    let settings = config.census_settings();

    // Check /proc filesystem
    if proc || all {
        let root = config.proc_root();
        println!("\n📁 Checking {} filesystem...", root.display());
        if root.is_dir() {
            println!("   ✅ {} accessible", root.display());

            let proc_entries = collect_proc_entries(&root, Some(5));
            if proc_entries.is_empty() {
                println!("   ❌ Cannot read any process entries from {}", root.display());
                all_ok = false;
            } else {
                println!("   ✅ Can read {} process entries", proc_entries.len());
            }

            let table = ProcFs::new(&root);
            match table.root_namespaces() {
                Ok(ns) => println!(
                    "   ✅ Root namespaces resolved: pid={}, net={}",
                    ns.pid, ns.net
                ),
                Err(e) => {
                    println!("   ❌ {}", e);
                    if settings.strategy == Strategy::Namespace {
                        all_ok = false;
                    }
                }
            }

            let own_pid = std::process::id();
            match table.read_membership(own_pid, settings.cgroup_read_limit) {
                Ok(text) => println!("   ✅ cgroup membership readable ({} bytes)", text.len()),
                Err(e) => {
                    println!("   ❌ {}", e);
                    if settings.strategy == Strategy::Cgroup {
                        all_ok = false;
                    }
                }
            }
        } else {
            println!("   ❌ {} not found", root.display());
            all_ok = false;
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
            println!(
                "   ├─ Strategy: {}, limit: {} containers ({:?})",
                settings.strategy, settings.max_containers, settings.bound_policy
            );
            println!("   └─ cgroup markers: {}", settings.cgroup_markers.join(", "));
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
