//! Insertion order computation.
//!
//! One [`DependencyNode`] is built per entity in the import. Dependencies
//! come from the polymorphic inferencer and from the associations the
//! catalog reports for each entity, plus its subtype overlays:
//!
//! - belongs-to: the owner depends on the target
//! - has-one / has-many without `through`: the target depends on the owner
//! - through, polymorphic and many-to-many associations add nothing
//!
//! Self-dependencies and dependencies on entities outside the import are
//! dropped. Nodes are then removed one at a time, always taking the first
//! free node in name order, so the result is deterministic.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use live_fixtures_schema::{AssociationKind, EntityType, SchemaCatalog};

use crate::error::CycleError;
use crate::polymorphic::DiscoveredEdges;

/// Graph node used while the order is being computed.
#[derive(Debug, Clone)]
struct DependencyNode {
	entity: String,
	depends_on: BTreeSet<usize>,
}

/// Dependency graph over the entities of one import.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
	nodes: Vec<DependencyNode>,
}

impl DependencyGraph {
	/// Builds the graph for `entities`, seeded with `discovered` edges.
	///
	/// Base associations are taken from `catalog`, not from the entity's own
	/// declaration.
	pub fn build<'a, I>(
		catalog: &dyn SchemaCatalog,
		entities: I,
		discovered: &DiscoveredEdges,
	) -> Self
	where
		I: IntoIterator<Item = &'a EntityType>,
	{
		let mut entities: Vec<&EntityType> = entities.into_iter().collect();
		entities.sort_by(|a, b| a.name().cmp(b.name()));
		entities.dedup_by(|a, b| a.name() == b.name());

		let index: HashMap<&str, usize> = entities
			.iter()
			.enumerate()
			.map(|(i, entity)| (entity.name(), i))
			.collect();
		let mut nodes: Vec<DependencyNode> = entities
			.iter()
			.map(|entity| DependencyNode {
				entity: entity.name().to_string(),
				depends_on: BTreeSet::new(),
			})
			.collect();

		let mut add_edge = |from: &str, to: &str| {
			if let (Some(&from), Some(&to)) = (index.get(from), index.get(to))
				&& from != to
			{
				nodes[from].depends_on.insert(to);
			}
		};

		for (entity, targets) in discovered {
			for target in targets {
				add_edge(entity.as_str(), target.as_str());
			}
		}

		for entity in &entities {
			let associations = catalog
				.associations_of(entity)
				.iter()
				.chain(entity.overlay_associations());
			for association in associations {
				let Some(target) = association.target() else {
					continue;
				};
				match association.kind() {
					AssociationKind::BelongsTo => add_edge(entity.name(), target),
					AssociationKind::HasOne | AssociationKind::HasMany
						if association.through().is_none() =>
					{
						add_edge(target, entity.name())
					}
					_ => {}
				}
			}
		}

		Self { nodes }
	}

	/// Direct dependencies of `entity`, by name, or `None` outside the graph.
	pub fn dependencies_of(&self, entity: &str) -> Option<BTreeSet<&str>> {
		self.nodes
			.iter()
			.find(|node| node.entity == entity)
			.map(|node| {
				node.depends_on
					.iter()
					.map(|&i| self.nodes[i].entity.as_str())
					.collect()
			})
	}

	/// Every edge as `(entity, dependency)`.
	pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
		self.nodes.iter().flat_map(move |node| {
			node.depends_on
				.iter()
				.map(move |&i| (node.entity.as_str(), self.nodes[i].entity.as_str()))
		})
	}

	/// Orders the entities so that every dependency comes first.
	pub fn into_order(self) -> Result<Vec<String>, CycleError> {
		let mut remaining: BTreeMap<usize, DependencyNode> =
			self.nodes.into_iter().enumerate().collect();
		let mut order = Vec::with_capacity(remaining.len());

		while !remaining.is_empty() {
			// BTreeMap keys follow name order, so the first free node wins ties.
			let free = remaining
				.iter()
				.find(|(_, node)| node.depends_on.is_empty())
				.map(|(&i, _)| i);

			let Some(free) = free else {
				let unresolved = remaining
					.values()
					.map(|node| {
						let dependencies = node
							.depends_on
							.iter()
							.filter_map(|i| remaining.get(i))
							.map(|dependency| dependency.entity.clone())
							.collect();
						(node.entity.clone(), dependencies)
					})
					.collect();
				return Err(CycleError { unresolved });
			};

			if let Some(node) = remaining.remove(&free) {
				order.push(node.entity);
			}
			for node in remaining.values_mut() {
				node.depends_on.remove(&free);
			}
		}

		Ok(order)
	}
}

/// Computes the insertion order of `entities` as entity names.
///
/// # Examples
///
/// ```
/// use live_fixtures_import::order::compute_insert_order;
/// use live_fixtures_import::polymorphic::DiscoveredEdges;
/// use live_fixtures_schema::{Association, EntityType, SchemaCatalog, StaticCatalog};
///
/// let catalog = StaticCatalog::builder()
///     .entity(EntityType::new("Writer", "writers"))
///     .entity(
///         EntityType::new("Article", "articles")
///             .with_association(Association::belongs_to("writer", "Writer")),
///     )
///     .build()
///     .unwrap();
/// let entities = ["Article", "Writer"].map(|name| catalog.entity(name).unwrap());
///
/// let order = compute_insert_order(&catalog, entities, &DiscoveredEdges::new()).unwrap();
/// assert_eq!(order, vec!["Writer", "Article"]);
/// ```
pub fn compute_insert_order<'a, I>(
	catalog: &dyn SchemaCatalog,
	entities: I,
	discovered: &DiscoveredEdges,
) -> Result<Vec<String>, CycleError>
where
	I: IntoIterator<Item = &'a EntityType>,
{
	DependencyGraph::build(catalog, entities, discovered).into_order()
}
