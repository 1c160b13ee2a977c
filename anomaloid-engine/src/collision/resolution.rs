// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Mass-based collision resolution
//!
//! Every recorded `CollidedWith` pair is arbitrated once: the heavier body
//! survives and the lighter is destroyed. Equal masses are broken by entity
//! order, destroying the higher of the two handles.
//!
//! Pairs are visited in canonical order. Once a body is condemned, every
//! later pair involving it is discarded, so a body is never destroyed twice
//! and a doomed body's mass never decides another pair.

use crate::collision::CollidedWith;
use crate::ecs::components::{AnomalyMult, Mass};
use crate::ecs::{canonical_pair, component_name, CachedQuery, Entity, QueryBuilder, System, SystemReport, World};
use crate::error::{EcsError, INTEGRITY_TARGET};
use log::{debug, warn};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Which rule decided an arbitration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbitrationRule {
    /// The masses differed
    HeavierSurvives,
    /// The masses were equal; the higher entity lost
    TieBreak,
}

/// Outcome of comparing two colliding bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arbitration {
    /// Body that survives
    pub winner: Entity,
    /// Body that is destroyed
    pub loser: Entity,
    /// Rule that decided
    pub rule: ArbitrationRule,
}

/// Decide which of two colliding bodies is destroyed
///
/// # Examples
///
/// ```
/// use anomaloid_engine::collision::{arbitrate, ArbitrationRule};
/// use anomaloid_engine::ecs::components::Mass;
/// use anomaloid_engine::ecs::Entity;
///
/// let light = Entity::new(0, 0);
/// let heavy = Entity::new(1, 0);
/// let outcome = arbitrate((light, Mass::new(5.0)), (heavy, Mass::new(10.0)));
/// assert_eq!(outcome.loser, light);
/// assert_eq!(outcome.rule, ArbitrationRule::HeavierSurvives);
/// ```
pub fn arbitrate(first: (Entity, Mass), second: (Entity, Mass)) -> Arbitration {
    let (a, mass_a) = first;
    let (b, mass_b) = second;
    match mass_a.value().total_cmp(&mass_b.value()) {
        Ordering::Greater => Arbitration {
            winner: a,
            loser: b,
            rule: ArbitrationRule::HeavierSurvives,
        },
        Ordering::Less => Arbitration {
            winner: b,
            loser: a,
            rule: ArbitrationRule::HeavierSurvives,
        },
        Ordering::Equal => Arbitration {
            winner: a.min(b),
            loser: a.max(b),
            rule: ArbitrationRule::TieBreak,
        },
    }
}

/// A pair that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionFault {
    /// The anomaloid whose relation led to the pair
    pub subject: Entity,
    /// The other end of the pair
    pub partner: Entity,
    /// Why the pair was skipped
    pub error: EcsError,
}

/// Result of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionReport {
    /// Distinct pairs looked at
    pub examined: usize,
    /// Arbitrations carried out, in visiting order
    pub resolved: Vec<Arbitration>,
    /// Pairs skipped because one end was already condemned
    pub discarded: usize,
    /// Pairs skipped because of an integrity fault
    pub faults: Vec<CollisionFault>,
}

impl ResolutionReport {
    /// Entities destroyed by the pass
    pub fn destroyed(&self) -> Vec<Entity> {
        self.resolved.iter().map(|outcome| outcome.loser).collect()
    }
}

/// Resolves recorded collisions between anomaloids
///
/// Keeps a cached query over entities that hold `Mass` and `AnomalyMult`
/// and take part in a `CollidedWith` pair; the query is only re-evaluated
/// when the world's structure changed since the last pass.
pub struct CollisionResolver {
    query: CachedQuery,
}

impl CollisionResolver {
    /// Create a resolver
    pub fn new() -> Self {
        CollisionResolver {
            query: QueryBuilder::new()
                .with::<Mass>()
                .with::<AnomalyMult>()
                .with_relation::<CollidedWith>()
                .build(),
        }
    }

    /// Arbitrate every recorded pair and clear the relation
    ///
    /// Destructions and the relation clear are buffered in a deferred scope
    /// and land together when it commits. Integrity faults are logged and
    /// reported, never returned as errors.
    pub fn resolve(&mut self, world: &mut World) -> Result<ResolutionReport, EcsError> {
        // Canonical pair -> the anomaloid that reached it first
        let mut pairs: BTreeMap<(Entity, Entity), Entity> = BTreeMap::new();
        for &subject in self.query.matches(world) {
            for partner in world.related::<CollidedWith>(subject) {
                pairs
                    .entry(canonical_pair::<CollidedWith>(subject, partner))
                    .or_insert(subject);
            }
        }

        let mut report = ResolutionReport::default();
        world.deferred(|world| {
            let mut condemned: BTreeSet<Entity> = BTreeSet::new();
            for ((low, high), subject) in pairs {
                let partner = if subject == low { high } else { low };
                report.examined += 1;

                if condemned.contains(&subject) || condemned.contains(&partner) {
                    debug!("discarding {} - {}: already condemned", low, high);
                    report.discarded += 1;
                    continue;
                }

                let (subject_mass, partner_mass) = match pair_masses(world, subject, partner) {
                    Ok(masses) => masses,
                    Err(error) => {
                        warn!(
                            target: INTEGRITY_TARGET,
                            "skipping collision {} - {}: {}", subject, partner, error
                        );
                        report.faults.push(CollisionFault {
                            subject,
                            partner,
                            error,
                        });
                        continue;
                    }
                };

                let outcome = arbitrate((subject, subject_mass), (partner, partner_mass));
                debug!(
                    "{} ({}) vs {} ({}): {} destroyed by {:?}",
                    subject,
                    subject_mass.value(),
                    partner,
                    partner_mass.value(),
                    outcome.loser,
                    outcome.rule
                );
                world.destroy_entity(outcome.loser);
                condemned.insert(outcome.loser);
                report.resolved.push(outcome);
            }

            world.clear_relation::<CollidedWith>();
            Ok::<(), EcsError>(())
        })?;

        Ok(report)
    }
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Masses of both ends of a pair, or the integrity fault preventing it
fn pair_masses(world: &World, subject: Entity, partner: Entity) -> Result<(Mass, Mass), EcsError> {
    if !world.is_entity_alive(partner) {
        return Err(EcsError::DanglingRelation { entity: partner });
    }
    let missing = |entity| EcsError::MissingComponent {
        entity,
        component: component_name::<Mass>(),
    };
    let subject_mass = *world.get::<Mass>(subject).ok_or_else(|| missing(subject))?;
    let partner_mass = *world.get::<Mass>(partner).ok_or_else(|| missing(partner))?;
    Ok((subject_mass, partner_mass))
}

/// Resolve all collisions between anomaloids
///
/// Convenience wrapper around a one-off [`CollisionResolver`].
pub fn resolve_collisions(world: &mut World) -> Result<ResolutionReport, EcsError> {
    CollisionResolver::new().resolve(world)
}

/// Resolution pass as a schedulable system
#[derive(Default)]
pub struct CollisionResolutionSystem {
    resolver: CollisionResolver,
}

impl CollisionResolutionSystem {
    /// Create a new resolution system
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for CollisionResolutionSystem {
    fn run(&mut self, world: &mut World) -> Result<SystemReport, EcsError> {
        let report = self.resolver.resolve(world)?;
        Ok(SystemReport {
            examined: report.examined,
            destroyed: report.resolved.len(),
            discarded: report.discarded,
            faults: report.faults.into_iter().map(|fault| fault.error).collect(),
            ..SystemReport::default()
        })
    }

    fn name(&self) -> &str {
        "CollisionResolutionSystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anomaloid(world: &mut World, mass: f64) -> Entity {
        let entity = world.create_entity().unwrap();
        world.set(entity, Mass::new(mass)).unwrap();
        world.set(entity, AnomalyMult(1.0)).unwrap();
        entity
    }

    #[test]
    fn test_arbitrate_heavier_survives() {
        let a = Entity::new(0, 0);
        let b = Entity::new(1, 0);

        let outcome = arbitrate((a, Mass::new(10.0)), (b, Mass::new(5.0)));
        assert_eq!((outcome.winner, outcome.loser), (a, b));

        let outcome = arbitrate((a, Mass::new(5.0)), (b, Mass::new(10.0)));
        assert_eq!((outcome.winner, outcome.loser), (b, a));
    }

    #[test]
    fn test_arbitrate_tie_destroys_higher_entity_either_way() {
        let a = Entity::new(3, 0);
        let b = Entity::new(7, 0);

        let forward = arbitrate((a, Mass::new(7.0)), (b, Mass::new(7.0)));
        let backward = arbitrate((b, Mass::new(7.0)), (a, Mass::new(7.0)));
        assert_eq!(forward, backward);
        assert_eq!(forward.loser, b);
        assert_eq!(forward.rule, ArbitrationRule::TieBreak);
    }

    #[test]
    fn test_resolve_destroys_lighter() {
        let mut world = World::new();
        let light = anomaloid(&mut world, 5.0);
        let heavy = anomaloid(&mut world, 10.0);
        world.relate::<CollidedWith>(light, heavy).unwrap();

        let report = resolve_collisions(&mut world).unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.destroyed(), vec![light]);
        assert!(!world.is_entity_alive(light));
        assert!(world.is_entity_alive(heavy));
        assert_eq!(world.relation_count::<CollidedWith>(), 0);
    }

    #[test]
    fn test_shared_loser_is_destroyed_once() {
        let mut world = World::new();
        let small = anomaloid(&mut world, 1.0);
        let big = anomaloid(&mut world, 8.0);
        let bigger = anomaloid(&mut world, 9.0);
        world.relate::<CollidedWith>(small, big).unwrap();
        world.relate::<CollidedWith>(small, bigger).unwrap();

        let report = resolve_collisions(&mut world).unwrap();
        assert_eq!(report.examined, 2);
        assert_eq!(report.destroyed(), vec![small]);
        assert_eq!(report.discarded, 1);
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn test_condemned_body_does_not_decide_later_pairs() {
        let mut world = World::new();
        let a = anomaloid(&mut world, 10.0);
        let b = anomaloid(&mut world, 5.0);
        let c = anomaloid(&mut world, 3.0);
        world.relate::<CollidedWith>(a, b).unwrap();
        world.relate::<CollidedWith>(b, c).unwrap();

        let report = resolve_collisions(&mut world).unwrap();
        // (a, b) kills b first, so (b, c) is discarded and c survives
        assert_eq!(report.destroyed(), vec![b]);
        assert_eq!(report.discarded, 1);
        assert!(world.is_entity_alive(c));
    }

    #[test]
    fn test_partner_without_mass_is_a_fault() {
        let mut world = World::new();
        let rock = anomaloid(&mut world, 4.0);
        let ghost = world.create_entity().unwrap();
        world.relate::<CollidedWith>(rock, ghost).unwrap();

        let report = resolve_collisions(&mut world).unwrap();
        assert!(report.resolved.is_empty());
        assert_eq!(report.faults.len(), 1);
        assert_eq!(
            report.faults[0].error,
            EcsError::MissingComponent {
                entity: ghost,
                component: "Mass"
            }
        );
        assert!(world.is_entity_alive(rock));
        assert!(world.is_entity_alive(ghost));
    }

    #[test]
    fn test_non_anomaloids_do_not_open_resolution() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();
        world.set(a, Mass::new(1.0)).unwrap();
        world.set(b, Mass::new(2.0)).unwrap();
        world.relate::<CollidedWith>(a, b).unwrap();

        let report = resolve_collisions(&mut world).unwrap();
        assert_eq!(report.examined, 0);
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn test_resolver_reuses_cached_query() {
        let mut world = World::new();
        anomaloid(&mut world, 1.0);
        let mut resolver = CollisionResolver::new();

        resolver.resolve(&mut world).unwrap();
        resolver.resolve(&mut world).unwrap();
        assert_eq!(resolver.query.evaluations(), 1);
    }
}
