//! Candidate selection: which pool a growth step draws from, and which
//! prefab in that pool.

use delver_logic::config::KindWeights;
use delver_logic::constants::SizeClass;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{PoolKind, PrefabCatalog, PrefabId};

/// Pools that contain at least one prefab able to attach to `class`.
pub fn eligible_pools(catalog: &PrefabCatalog, class: SizeClass) -> Vec<PoolKind> {
    PoolKind::all()
        .into_iter()
        .filter(|&kind| !compatible_prefabs(catalog, catalog.pool(kind), class).is_empty())
        .collect()
}

/// Prefabs from `pool` having at least one socket of `class`.
pub fn compatible_prefabs(catalog: &PrefabCatalog, pool: &[PrefabId], class: SizeClass) -> Vec<PrefabId> {
    pool.iter()
        .copied()
        .filter(|&id| {
            catalog
                .part(id)
                .map(|p| p.has_socket_class(class))
                .unwrap_or(false)
        })
        .collect()
}

/// Weighted pool choice among `eligible`.
///
/// When the special pool wins but `special_allowed` is false, the step
/// falls back to rooms, then hallways. `None` means nothing can attach.
pub fn choose_pool<R: Rng + ?Sized>(
    rng: &mut R,
    weights: &KindWeights,
    eligible: &[PoolKind],
    special_allowed: bool,
) -> Option<PoolKind> {
    let weighted: Vec<(PoolKind, f32)> = eligible
        .iter()
        .map(|&k| (k, weight_of(weights, k)))
        .filter(|&(_, w)| w > 0.0)
        .collect();
    let dist = WeightedIndex::new(weighted.iter().map(|&(_, w)| w)).ok()?;
    let pick = weighted[dist.sample(rng)].0;
    if pick != PoolKind::Special || special_allowed {
        return Some(pick);
    }
    [PoolKind::Room, PoolKind::Hallway]
        .into_iter()
        .find(|k| eligible.contains(k))
}

fn weight_of(weights: &KindWeights, kind: PoolKind) -> f32 {
    match kind {
        PoolKind::Hallway => weights.hallway,
        PoolKind::Room => weights.room,
        PoolKind::Special => weights.special,
    }
}

/// Uniform pick among the pool's prefabs that can attach to `class`.
pub fn pick_prefab<R: Rng + ?Sized>(
    rng: &mut R,
    catalog: &PrefabCatalog,
    pool: &[PrefabId],
    class: SizeClass,
) -> Option<PrefabId> {
    compatible_prefabs(catalog, pool, class).choose(rng).copied()
}
