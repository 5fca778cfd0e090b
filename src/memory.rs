//! Memory-pressure check gating cache inserts.
//!
//! Grounded in the reference crate's own `memory` module, but the fixed
//! "100MB or 10% of total RAM" threshold that module hardcodes for an
//! embedded router doesn't mean anything for a proxy whose cache is already
//! explicitly bounded by its own `cache_size_max`/`element_size_max`
//! configuration. The headroom required here instead scales with that
//! configuration: the system must have room for the cache to reach its
//! configured cap *and* accept one more max-size element on top of it,
//! which is the actual allocation this call is about to make.

use std::fs;

/// Returns `false` only when the system is demonstrably too low on memory
/// to safely grow the cache toward its configured limits; defaults to
/// `true` (proceed) on platforms or failures where the check can't be
/// performed.
///
/// `cache_size_max` and `element_size_max` are the same bounds the calling
/// `ProxyCache` enforces on its own contents (§3); `current_size` is how
/// much of that budget is already resident.
pub fn has_sufficient_memory(current_size: usize, cache_size_max: usize, element_size_max: usize) -> bool {
    #[cfg(target_os = "linux")]
    {
        if let Ok(meminfo) = fs::read_to_string("/proc/meminfo") {
            let mut mem_available_kb = 0usize;

            for line in meminfo.lines() {
                if let Some(rest) = line.strip_prefix("MemAvailable:") {
                    mem_available_kb = rest.split_whitespace().next().and_then(|v| v.parse().ok()).unwrap_or(0);
                    break;
                }
            }
            let mem_available = mem_available_kb.saturating_mul(1024);

            // Room left to grow toward the configured cap, plus headroom for
            // the element this call is about to insert.
            let room_to_cap = cache_size_max.saturating_sub(current_size);
            let required = room_to_cap.max(element_size_max);

            let sufficient = mem_available > required;
            tracing::debug!(
                available_mb = mem_available / (1024 * 1024),
                required_mb = required / (1024 * 1024),
                sufficient,
                "memory check"
            );
            return sufficient;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_returns_a_bool() {
        let _ = has_sufficient_memory(0, 1_000_000, 100_000);
    }

    #[test]
    fn never_blocks_when_well_under_configured_cap() {
        // Tiny configured budget: any real test machine has more than a few
        // KB free, so this should never report insufficient memory.
        assert!(has_sufficient_memory(0, 4096, 1024));
    }
}
