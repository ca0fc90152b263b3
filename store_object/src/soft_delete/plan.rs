use super::outcome::{ProtectedDependent, RecordRef};
use crate::backend::StorageTransaction;
use crate::errors::StoreError;
use crate::id_type::UniversalId;
use crate::relation::OnDelete;
use crate::schema::{RelationRegistry, TableSchema};
use crate::scope::QueryScope;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

/// Dependents of one set-null relation whose foreign key must be cleared
#[derive(Debug)]
pub(crate) struct Nullification {
    pub schema: TableSchema,
    pub foreign_key: &'static str,
    pub ids: Vec<UniversalId>,
}

/// Writes a soft delete will perform, gathered before any of them happen
#[derive(Debug, Default)]
pub(crate) struct DeletePlan {
    /// Cascaded deactivations grouped by table, in discovery order
    pub deactivate: IndexMap<&'static str, (TableSchema, Vec<UniversalId>)>,
    pub nullify: Vec<Nullification>,
    pub blockers: Vec<ProtectedDependent>,
}

impl DeletePlan {
    /// Walk inbound relations breadth first from the root without writing anything
    ///
    /// Every record is expanded at most once, so cyclic relation graphs terminate.
    pub async fn build(
        registry: &RelationRegistry,
        root: &TableSchema,
        root_id: &UniversalId,
        tx: &mut dyn StorageTransaction,
        protect_scope: QueryScope,
    ) -> Result<Self, StoreError> {
        let mut plan = Self::default();
        let mut visited: HashSet<(&'static str, UniversalId)> = HashSet::new();
        visited.insert((root.table, root_id.clone()));

        let mut pending = VecDeque::from([(*root, root_id.clone())]);
        while let Some((schema, id)) = pending.pop_front() {
            for (relation, dependent) in registry.dependents_of(schema.table) {
                match relation.on_delete {
                    OnDelete::Cascade => {
                        let ids = tx
                            .dependents(relation, &dependent, &id, QueryScope::Active)
                            .await?;
                        for dependent_id in ids {
                            if !visited.insert((dependent.table, dependent_id.clone())) {
                                continue;
                            }
                            plan.deactivate
                                .entry(dependent.table)
                                .or_insert_with(|| (dependent, Vec::new()))
                                .1
                                .push(dependent_id.clone());
                            pending.push_back((dependent, dependent_id));
                        }
                    }
                    OnDelete::SetNull => {
                        let ids = tx
                            .dependents(relation, &dependent, &id, QueryScope::Active)
                            .await?;
                        if !ids.is_empty() {
                            plan.nullify.push(Nullification {
                                schema: dependent,
                                foreign_key: relation.foreign_key,
                                ids,
                            });
                        }
                    }
                    OnDelete::Protect => {
                        let ids = tx
                            .dependents(relation, &dependent, &id, protect_scope)
                            .await?;
                        plan.blockers
                            .extend(ids.into_iter().map(|dependent_id| ProtectedDependent {
                                table: dependent.table,
                                foreign_key: relation.foreign_key,
                                id: dependent_id,
                                protects_table: schema.table,
                                protects_id: id.clone(),
                            }));
                    }
                    OnDelete::Ignore => {}
                }
            }
        }

        Ok(plan)
    }

    pub fn cascaded(&self) -> Vec<RecordRef> {
        self.deactivate
            .iter()
            .flat_map(|(table, (_, ids))| ids.iter().map(|id| RecordRef::new(table, id.clone())))
            .collect()
    }
}
