//! Partition path layout (spec.md §6):
//! `<base>/<tier>/<YYYY>/<MM>/<DD>/<epoch_ms>-<12-hex-nonce>.wal[.gz]`

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use rand::RngCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Hot,
    Warm,
    Cold,
}

impl Tier {
    pub fn dir_name(self) -> &'static str {
        match self {
            Tier::Hot => "hot",
            Tier::Warm => "warm",
            Tier::Cold => "cold",
        }
    }
}

/// 12 hex chars = 48 bits of randomness, fixed by spec.md §9 to make
/// same-millisecond nonce collisions negligible.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 6];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn partition_path(base: &Path, tier: Tier, created_at: DateTime<Utc>, nonce: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    path.push(tier.dir_name());
    path.push(format!("{:04}", created_at.year()));
    path.push(format!("{:02}", created_at.month()));
    path.push(format!("{:02}", created_at.day()));
    let suffix = if tier == Tier::Cold { ".wal.gz" } else { ".wal" };
    path.push(format!("{}-{}{}", created_at.timestamp_millis(), nonce, suffix));
    path
}

/// Lists partition files under `base/tier`, ordered by `(date, epoch_ms,
/// nonce)` lexicographic on path — which is also creation order, since the
/// path components are laid out date-then-epoch-then-nonce.
pub fn list_partitions(base: &Path, tier: Tier) -> std::io::Result<Vec<PathBuf>> {
    let root = base.join(tier.dir_name());
    let mut out = Vec::new();
    collect_wal_files(&root, &mut out)?;
    out.sort();
    Ok(out)
}

fn collect_wal_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            collect_wal_files(&path, out)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(".wal") || n.ends_with(".wal.gz"))
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
    Ok(())
}
