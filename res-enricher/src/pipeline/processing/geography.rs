//! Geography hierarchy resolution.
//!
//! Every geography node owes its country and region to some ancestor on the
//! parent chain (inclusive of itself). The walk is iterative with a step
//! bound, so cyclic or dangling reference data fails with
//! `MalformedHierarchy` instead of recursing forever, and resolved ids are
//! memoized so shared ancestor chains are walked once.

use std::collections::HashMap;

use res_core::domain::{GeographyNode, ResolvedGeography};
use res_core::{EnrichError, Result};
use tracing::debug;

pub struct GeographyResolver {
    nodes: HashMap<i64, GeographyNode>,
}

/// Immutable output of a full resolution pass: node id to resolved geography.
pub struct GeographyIndex {
    resolved: HashMap<i64, ResolvedGeography>,
}

impl GeographyIndex {
    pub fn lookup(&self, area_id: i64) -> Option<&ResolvedGeography> {
        self.resolved.get(&area_id)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

impl GeographyResolver {
    pub fn new(nodes: Vec<GeographyNode>) -> Self {
        let nodes = nodes.into_iter().map(|n| (n.id, n)).collect();
        Self { nodes }
    }

    /// Resolve every node to its owning country and region.
    pub fn resolve_all(&self) -> Result<GeographyIndex> {
        let mut country_cache: HashMap<i64, i64> = HashMap::new();
        let mut region_cache: HashMap<i64, Option<i64>> = HashMap::new();

        let mut resolved = HashMap::with_capacity(self.nodes.len());
        for node in self.nodes.values() {
            let country_id = self.resolve_country(node.id, &mut country_cache)?;
            let region_id = self.resolve_region(node.id, &mut region_cache)?;

            let country_name = self
                .nodes
                .get(&country_id)
                .map(|n| n.name.clone())
                .ok_or_else(|| EnrichError::MalformedHierarchy {
                    node_id: country_id,
                    reason: "resolved country id has no node".to_string(),
                })?;
            let region_name = match region_id {
                Some(rid) => Some(
                    self.nodes
                        .get(&rid)
                        .map(|n| n.name.clone())
                        .ok_or_else(|| EnrichError::MalformedHierarchy {
                            node_id: rid,
                            reason: "resolved region id has no node".to_string(),
                        })?,
                ),
                None => None,
            };

            resolved.insert(
                node.id,
                ResolvedGeography {
                    id: node.id,
                    name: node.name.clone(),
                    country_id,
                    country_name,
                    region_id,
                    region_name,
                },
            );
        }

        debug!("resolved {} geography nodes", resolved.len());
        Ok(GeographyIndex { resolved })
    }

    /// Nearest country-flagged ancestor, inclusive of the node itself.
    pub fn resolve_country(&self, start: i64, cache: &mut HashMap<i64, i64>) -> Result<i64> {
        let mut path = Vec::new();
        let mut current = start;
        let country = loop {
            if let Some(&hit) = cache.get(&current) {
                break hit;
            }
            let node = self.node(current, start)?;
            if node.is_country {
                break current;
            }
            path.push(current);
            if path.len() > self.nodes.len() {
                return Err(EnrichError::MalformedHierarchy {
                    node_id: start,
                    reason: "parent chain exceeds node count (cycle)".to_string(),
                });
            }
            current = self.parent_of(node)?;
        };
        for id in path {
            cache.insert(id, country);
        }
        cache.insert(current, country);
        Ok(country)
    }

    /// Nearest region-flagged ancestor, inclusive of self; None when a
    /// country-flagged node is reached first.
    pub fn resolve_region(
        &self,
        start: i64,
        cache: &mut HashMap<i64, Option<i64>>,
    ) -> Result<Option<i64>> {
        let mut path = Vec::new();
        let mut current = start;
        let region = loop {
            if let Some(&hit) = cache.get(&current) {
                break hit;
            }
            let node = self.node(current, start)?;
            if node.is_region {
                break Some(current);
            }
            if node.is_country {
                break None;
            }
            path.push(current);
            if path.len() > self.nodes.len() {
                return Err(EnrichError::MalformedHierarchy {
                    node_id: start,
                    reason: "parent chain exceeds node count (cycle)".to_string(),
                });
            }
            current = self.parent_of(node)?;
        };
        for id in path {
            cache.insert(id, region);
        }
        cache.insert(current, region);
        Ok(region)
    }

    fn node(&self, id: i64, walk_start: i64) -> Result<&GeographyNode> {
        self.nodes
            .get(&id)
            .ok_or_else(|| EnrichError::MalformedHierarchy {
                node_id: walk_start,
                reason: format!("dangling parent pointer to {}", id),
            })
    }

    /// A root (no parent, or a self-pointer) that is not country-flagged can
    /// never resolve, so it is reported as malformed rather than looped on.
    fn parent_of(&self, node: &GeographyNode) -> Result<i64> {
        match node.parent_id {
            Some(parent) if parent != node.id => Ok(parent),
            _ => Err(EnrichError::MalformedHierarchy {
                node_id: node.id,
                reason: "root node is not country-flagged".to_string(),
            }),
        }
    }
}
