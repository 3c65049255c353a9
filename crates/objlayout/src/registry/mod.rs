// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout registry.
//!
//! Maps type names to their current layout and generated accessors.
//! Declarations serialize on one mutex held from lookup through publication;
//! the map itself is published through an [`ArcSwap`], so readers never
//! lock and never observe a half-installed entry.

pub mod resolver;


use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::accessor::{FieldAccessor, FieldAccessors, SharedRecords};
use crate::config::RegistryConfig;
use crate::descriptor::{build_descriptor, Declaration, FieldSpec, Representation, TypeDescriptor};
use crate::error::{DefinitionError, MembershipError};
use crate::instance::Instance;
use crate::layout::{InstanceLayout, LayoutHandle, LayoutId};
use crate::membership::typep_to_layout;
use crate::types::{RecordTypes, TypeExpr, TypeResolver};

use self::resolver::{classify, RedefinitionConflict, RedefinitionReport, Resolution};

static GLOBAL_REGISTRY: OnceLock<LayoutRegistry> = OnceLock::new();

/// Current entry for a type name.
#[derive(Debug)]
pub struct RegisteredType {
    pub layout: LayoutHandle,
    pub accessors: Arc<FieldAccessors>,
}

type TypeMap = HashMap<Arc<str>, Arc<RegisteredType>>;

/// What a declaration did.
#[derive(Debug)]
pub enum Transition {
    /// First declaration of the name.
    Fresh,
    /// Same layout, descriptor swapped in place.
    Compatible {
        report: RedefinitionReport,
        /// Descendants invalidated because the type grew under them.
        invalidated: Vec<Arc<str>>,
    },
    /// New layout installed; `old` is now invalid.
    Superseded {
        old: LayoutHandle,
        report: RedefinitionReport,
        /// Descendant types invalidated along with `old`.
        invalidated: Vec<Arc<str>>,
    },
    /// Same layout, descriptor forced in place.
    Clobbered(RedefinitionReport),
}

/// Result of a successful declaration.
#[derive(Debug)]
pub struct Declared {
    pub layout: LayoutHandle,
    pub accessors: Arc<FieldAccessors>,
    pub transition: Transition,
}

/// Declaration counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub fresh: u64,
    pub compatible: u64,
    pub superseded: u64,
    pub clobbered: u64,
    /// Layouts invalidated as descendants of a changed type.
    pub invalidated: u64,
    pub rejected: u64,
}

impl RegistryStats {
    fn record(&mut self, result: &Result<Declared, DefinitionError>) {
        match result {
            Ok(declared) => match &declared.transition {
                Transition::Fresh => self.fresh += 1,
                Transition::Compatible { invalidated, .. } => {
                    self.compatible += 1;
                    self.invalidated += invalidated.len() as u64;
                }
                Transition::Superseded { invalidated, .. } => {
                    self.superseded += 1;
                    self.invalidated += invalidated.len() as u64;
                }
                Transition::Clobbered(_) => self.clobbered += 1,
            },
            Err(_) => self.rejected += 1,
        }
    }
}

/// Lock-free read side, shared with generated accessors.
struct Shared {
    current: ArcSwap<TypeMap>,
}

impl Shared {
    fn get(&self, name: &str) -> Option<Arc<RegisteredType>> {
        self.current.load().get(name).cloned()
    }
}

impl RecordTypes for Shared {
    fn includes(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        let map = self.current.load();
        match (map.get(sub), map.get(sup)) {
            (Some(sub), Some(sup)) => {
                sub.layout.ancestors().get(sup.layout.depth()) == Some(&sup.layout.id())
            }
            _ => false,
        }
    }

    fn instance_of(&self, instance: &Instance, name: &str) -> Result<bool, MembershipError> {
        match self.get(name) {
            Some(entry) => typep_to_layout(instance.layout(), &entry.layout),
            None => Ok(false),
        }
    }
}

impl TypeResolver for Shared {
    fn is_subtype(&self, sub: &TypeExpr, sup: &TypeExpr) -> bool {
        sub.is_subtype_of(sup, self)
    }
}

/// Record knowledge handed to accessors without keeping the registry alive.
struct WeakRecords(Weak<Shared>);

impl RecordTypes for WeakRecords {
    fn includes(&self, sub: &str, sup: &str) -> bool {
        match self.0.upgrade() {
            Some(shared) => shared.includes(sub, sup),
            None => sub == sup,
        }
    }

    fn instance_of(&self, instance: &Instance, name: &str) -> Result<bool, MembershipError> {
        match self.0.upgrade() {
            Some(shared) => shared.instance_of(instance, name),
            None => Ok(instance.type_name() == name),
        }
    }
}

/// Registry of current layouts.
pub struct LayoutRegistry {
    shared: Arc<Shared>,
    write: Mutex<RegistryStats>,
    config: RegistryConfig,
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                current: ArcSwap::from_pointee(HashMap::new()),
            }),
            write: Mutex::new(RegistryStats::default()),
            config,
        }
    }

    /// Process-wide registry, created with default configuration on first use.
    pub fn global() -> &'static LayoutRegistry {
        GLOBAL_REGISTRY.get_or_init(LayoutRegistry::new)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn stats(&self) -> RegistryStats {
        *self.write.lock()
    }

    /// Declare a record type. Incompatible redefinitions are superseded.
    pub fn declare_type(
        &self,
        name: &str,
        parent: Option<&str>,
        fields: Vec<FieldSpec>,
    ) -> Result<LayoutHandle, DefinitionError> {
        let mut decl = Declaration::new(name).fields(fields);
        if let Some(parent) = parent {
            decl = decl.include(parent);
        }
        self.declare(&decl).map(|declared| declared.layout)
    }

    /// Declare, superseding on conflict.
    pub fn declare(&self, decl: &Declaration) -> Result<Declared, DefinitionError> {
        self.declare_with(decl, |_| Resolution::Supersede)
    }

    /// Declare, asking `choose` how to resolve an incompatible redefinition.
    ///
    /// `choose` runs under the registry's write lock and must not declare.
    pub fn declare_with<F>(&self, decl: &Declaration, choose: F) -> Result<Declared, DefinitionError>
    where
        F: FnOnce(&RedefinitionConflict) -> Resolution,
    {
        let mut stats = self.write.lock();
        let result = self.declare_locked(decl, choose);
        stats.record(&result);
        result
    }

    /// Register a descriptor built ahead of time with
    /// [`build`](crate::descriptor::build). Incompatible redefinitions are
    /// superseded.
    ///
    /// Inherited fields must sit where the parent's current layout puts them.
    pub fn register(&self, descriptor: TypeDescriptor) -> Result<Declared, DefinitionError> {
        self.register_with(descriptor, |_| Resolution::Supersede)
    }

    /// [`register`](Self::register) with an explicit conflict resolution.
    pub fn register_with<F>(
        &self,
        descriptor: TypeDescriptor,
        choose: F,
    ) -> Result<Declared, DefinitionError>
    where
        F: FnOnce(&RedefinitionConflict) -> Resolution,
    {
        let mut stats = self.write.lock();
        let result = self.register_locked(descriptor, choose);
        stats.record(&result);
        result
    }

    fn declare_locked<F>(
        &self,
        decl: &Declaration,
        choose: F,
    ) -> Result<Declared, DefinitionError>
    where
        F: FnOnce(&RedefinitionConflict) -> Resolution,
    {
        let type_name = decl.name.clone();
        if type_name.is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if decl.representation != Representation::Record {
            return Err(DefinitionError::NotRecordBacked { type_name });
        }

        let map = self.shared.current.load_full();
        let parent = self.resolve_parent(&map, &type_name, decl.include.as_ref())?;

        let parent_descriptor = parent.as_ref().map(|p| p.descriptor());
        let descriptor = Arc::new(build_descriptor(
            decl,
            parent_descriptor.as_deref(),
            &*self.shared,
        )?);

        self.install(&map, descriptor, parent, choose)
    }

    fn register_locked<F>(
        &self,
        descriptor: TypeDescriptor,
        choose: F,
    ) -> Result<Declared, DefinitionError>
    where
        F: FnOnce(&RedefinitionConflict) -> Resolution,
    {
        let type_name = descriptor.name().clone();
        if type_name.is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if descriptor.representation() != Representation::Record {
            return Err(DefinitionError::NotRecordBacked { type_name });
        }

        let map = self.shared.current.load_full();
        let parent = self.resolve_parent(&map, &type_name, descriptor.included_parent())?;
        if let Some(parent) = &parent {
            let inherited = parent.descriptor();
            let region_ok = inherited.raw_region_index() == descriptor.raw_region_index()
                || (inherited.raw_region_index().is_none()
                    && descriptor.raw_region_index() >= Some(inherited.boxed_slot_count()));
            let placed = inherited.fields().iter().all(|field| {
                descriptor
                    .field(&field.name)
                    .is_some_and(|ours| ours.same_location(field))
            });
            if !(region_ok && placed) {
                return Err(DefinitionError::StaleParent {
                    type_name,
                    parent: parent.name().clone(),
                });
            }
        }

        self.install(&map, Arc::new(descriptor), parent, choose)
    }

    /// Look up the included parent and check the chain it would form.
    fn resolve_parent(
        &self,
        map: &TypeMap,
        type_name: &Arc<str>,
        include: Option<&Arc<str>>,
    ) -> Result<Option<LayoutHandle>, DefinitionError> {
        let Some(parent_name) = include else {
            return Ok(None);
        };
        let entry = map.get(parent_name).ok_or_else(|| DefinitionError::UnknownParent {
            type_name: type_name.clone(),
            parent: parent_name.clone(),
        })?;
        self.check_chain(type_name, &entry.layout)?;
        Ok(Some(entry.layout.clone()))
    }

    /// Install `descriptor` as the current shape of its type, running the
    /// redefinition resolver when the name is already registered.
    fn install<F>(
        &self,
        map: &TypeMap,
        descriptor: Arc<TypeDescriptor>,
        parent: Option<LayoutHandle>,
        choose: F,
    ) -> Result<Declared, DefinitionError>
    where
        F: FnOnce(&RedefinitionConflict) -> Resolution,
    {
        let type_name = descriptor.name().clone();
        let Some(existing) = map.get(&type_name) else {
            let layout = InstanceLayout::new(descriptor.clone(), parent);
            let accessors = self.publish(map, &layout, descriptor, &[]);
            log::debug!(
                "[registry] declared '{}' as layout {} (depth {}, {} fields)",
                type_name,
                layout.id(),
                layout.depth(),
                layout.field_count()
            );
            return Ok(Declared {
                layout,
                accessors,
                transition: Transition::Fresh,
            });
        };

        let current = existing.layout.clone();
        let report = classify(&current, &descriptor, parent.as_ref(), &*self.shared);

        if report.is_compatible() {
            // Descendants already use the locations a grown parent hands out.
            let previous = current.descriptor();
            let grows = descriptor.boxed_slot_count() > previous.boxed_slot_count()
                || descriptor.raw_region_words() > previous.raw_region_words();
            let doomed = if grows {
                descendants_of(map, current.id())
            } else {
                Vec::new()
            };
            for (_, entry) in &doomed {
                entry.layout.invalidate();
            }
            let removed: Vec<Arc<str>> = doomed.iter().map(|(name, _)| name.clone()).collect();

            current.replace_descriptor(descriptor.clone());
            let accessors = self.publish(map, &current, descriptor, &removed);
            log::debug!(
                "[registry] compatible redefinition of '{}' kept layout {} (added {:?})",
                type_name,
                current.id(),
                report.added
            );
            if !removed.is_empty() {
                log::warn!(
                    "[registry] '{}' grew, invalidated descendants: {:?}",
                    type_name,
                    removed
                );
            }
            return Ok(Declared {
                layout: current,
                accessors,
                transition: Transition::Compatible {
                    report,
                    invalidated: removed,
                },
            });
        }

        let conflict = RedefinitionConflict::new(current, descriptor, report);
        let resolution = choose(&conflict);
        let (current, descriptor, report) = conflict.into_parts();

        match resolution {
            Resolution::Supersede => {
                let layout = InstanceLayout::new(descriptor.clone(), parent);
                let doomed = if self.config.invalidate_descendants_on_supersede {
                    descendants_of(map, current.id())
                } else {
                    Vec::new()
                };
                current.invalidate();
                for (_, entry) in &doomed {
                    entry.layout.invalidate();
                }
                let removed: Vec<Arc<str>> = doomed.iter().map(|(name, _)| name.clone()).collect();
                let accessors = self.publish(map, &layout, descriptor, &removed);

                if self.config.log_redefinitions {
                    log::warn!(
                        "[registry] superseded layout {} with {} ({})",
                        current.id(),
                        layout.id(),
                        report
                    );
                    if !removed.is_empty() {
                        log::warn!(
                            "[registry] invalidated descendants of '{}': {:?}",
                            type_name,
                            removed
                        );
                    }
                }
                Ok(Declared {
                    layout,
                    accessors,
                    transition: Transition::Superseded {
                        old: current,
                        report,
                        invalidated: removed,
                    },
                })
            }
            Resolution::Clobber(_token) => {
                if report.parent_changed {
                    return Err(DefinitionError::ClobberAcrossParents { type_name });
                }
                current.replace_descriptor(descriptor.clone());
                let accessors = self.publish(map, &current, descriptor, &[]);
                if self.config.log_redefinitions {
                    log::warn!(
                        "[registry] clobbered layout {} in place ({})",
                        current.id(),
                        report
                    );
                }
                Ok(Declared {
                    layout: current,
                    accessors,
                    transition: Transition::Clobbered(report),
                })
            }
        }
    }

    /// Reject circular or too deep inclusion under `parent`.
    fn check_chain(&self, type_name: &Arc<str>, parent: &LayoutHandle) -> Result<(), DefinitionError> {
        if parent
            .ancestor_chain()
            .iter()
            .any(|layout| layout.name() == type_name)
        {
            return Err(DefinitionError::CircularInclusion {
                type_name: type_name.clone(),
                parent: parent.name().clone(),
            });
        }
        let depth = parent.depth() + 1;
        if depth + 1 > self.config.max_depth {
            return Err(DefinitionError::InheritanceTooDeep {
                type_name: type_name.clone(),
                depth,
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    /// Generate accessors and install `layout` as current, dropping `removed`.
    /// Caller holds the write lock.
    fn publish(
        &self,
        map: &TypeMap,
        layout: &LayoutHandle,
        descriptor: Arc<TypeDescriptor>,
        removed: &[Arc<str>],
    ) -> Arc<FieldAccessors> {
        let records: SharedRecords = Arc::new(WeakRecords(Arc::downgrade(&self.shared)));
        let accessors = Arc::new(FieldAccessors::generate(
            descriptor,
            layout.clone(),
            records,
            self.config.default_policy,
        ));

        let mut next = map.clone();
        for name in removed {
            next.remove(name);
        }
        next.insert(
            layout.name().clone(),
            Arc::new(RegisteredType {
                layout: layout.clone(),
                accessors: accessors.clone(),
            }),
        );
        self.shared.current.store(Arc::new(next));
        accessors
    }

    /// Current layout of `name`.
    pub fn current_layout(&self, name: &str) -> Option<LayoutHandle> {
        self.shared.get(name).map(|entry| entry.layout.clone())
    }

    pub fn get(&self, name: &str) -> Option<Arc<RegisteredType>> {
        self.shared.get(name)
    }

    /// Accessors generated for the current layout of `name`.
    pub fn accessors(&self, name: &str) -> Option<Arc<FieldAccessors>> {
        self.shared.get(name).map(|entry| entry.accessors.clone())
    }

    /// Reader, writers and boundp of one field of the current layout.
    pub fn accessor(&self, type_name: &str, field: &str) -> Option<FieldAccessor> {
        self.shared
            .get(type_name)
            .and_then(|entry| entry.accessors.field(field).cloned())
    }

    /// Registered names, sorted.
    pub fn type_names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<_> = self.shared.current.load().keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered strict descendants of `name`, sorted.
    pub fn descendants(&self, name: &str) -> Vec<Arc<str>> {
        let map = self.shared.current.load();
        match map.get(name) {
            Some(entry) => descendants_of(&map, entry.layout.id())
                .into_iter()
                .map(|(name, _)| name)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Invalidate every registered descendant of `name` and drop them from
    /// the registry. `name` itself stays current. Returns the invalidated
    /// names, sorted.
    pub fn invalidate_subtree(&self, name: &str) -> Vec<Arc<str>> {
        let mut stats = self.write.lock();
        let map = self.shared.current.load_full();
        let Some(root) = map.get(name) else {
            return Vec::new();
        };

        let doomed = descendants_of(&map, root.layout.id());
        if doomed.is_empty() {
            return Vec::new();
        }
        let mut next = (*map).clone();
        for (name, entry) in &doomed {
            entry.layout.invalidate();
            next.remove(name);
        }
        self.shared.current.store(Arc::new(next));
        stats.invalidated += doomed.len() as u64;

        let names: Vec<Arc<str>> = doomed.into_iter().map(|(name, _)| name).collect();
        log::warn!("[registry] invalidated descendants of '{}': {:?}", name, names);
        names
    }
}

impl std::fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutRegistry")
            .field("types", &self.type_names())
            .field("config", &self.config)
            .finish()
    }
}

/// Entries whose ancestor table names `id` strictly above themselves, sorted
/// by name.
fn descendants_of(map: &TypeMap, id: LayoutId) -> Vec<(Arc<str>, Arc<RegisteredType>)> {
    let mut found: Vec<_> = map
        .iter()
        .filter(|(_, entry)| {
            let ancestors = entry.layout.ancestors();
            ancestors[..ancestors.len() - 1].contains(&id)
        })
        .map(|(name, entry)| (name.clone(), entry.clone()))
        .collect();
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found
}
