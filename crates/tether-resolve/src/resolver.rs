use fxhash::FxHashMap;
use tether_syntax::{Location, ModuleSpec, TypeRef};

use crate::error::{ResolveError, ResolveErrors, ResolveResult};
use crate::mapping::{CanonicalType, Channel};
use crate::model::*;
use crate::naming::{escape_keyword, is_valid_identifier, to_pascal_case, to_snake_case};

/// Methods the generated spec trait already defines.
const RESERVED_METHODS: &[&str] = &["new", "context", "emit"];

/// Types generated code names without a path.
const RESERVED_TYPES: &[&str] = &[
    "String", "Vec", "Option", "Result", "Box", "Nullable", "Promise", "ArrayBuffer", "Context", "HostValue",
];

/// Resolve every parsed module into one project model.
///
/// All modules are checked before failing, so the error lists every problem,
/// ordered by position.
pub fn resolve(modules: &[ModuleSpec]) -> ResolveResult<ProjectModel> {
    let mut resolver = Resolver::default();
    let mut model = ProjectModel::default();
    for spec in modules {
        if let Some(module) = resolver.resolve_module(spec) {
            resolver.share_types(&module, &mut model);
            model.modules.push(module);
        }
    }

    if resolver.errors.is_empty() {
        log::info!(
            "Resolved {} module(s), {} record(s), {} enum(s)",
            model.modules.len(),
            model.records.len(),
            model.enums.len()
        );
        Ok(model)
    } else {
        let mut errors = resolver.errors;
        errors.sort_by(|a, b| a.location().cmp(b.location()));
        Err(ResolveErrors { errors })
    }
}

#[derive(Debug, Clone, Copy)]
enum Case {
    Snake,
    Pascal,
}

/// One namespace of generated code. Remembers which source name claimed each
/// normalized identifier.
struct Scope {
    what: String,
    claimed: FxHashMap<String, String>,
}

impl Scope {
    fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            claimed: FxHashMap::default(),
        }
    }

    fn claim(&mut self, source: &str, canonical: &str, location: &Location, errors: &mut Vec<ResolveError>) -> bool {
        match self.claimed.get(canonical) {
            Some(previous) if previous == source => {
                errors.push(ResolveError::DuplicateName {
                    scope: self.what.clone(),
                    name: source.to_string(),
                    location: location.clone(),
                });
                false
            }
            Some(previous) => {
                errors.push(ResolveError::NameCollision {
                    scope: self.what.clone(),
                    first: previous.clone(),
                    second: source.to_string(),
                    canonical: canonical.to_string(),
                    location: location.clone(),
                });
                false
            }
            None => {
                self.claimed.insert(canonical.to_string(), source.to_string());
                true
            }
        }
    }
}

#[derive(Default)]
struct Resolver {
    errors: Vec<ResolveError>,
    /// Registered module name -> where it was registered.
    modules: FxHashMap<String, Location>,
    /// Project-wide Rust type name -> module that first defined it.
    type_owners: FxHashMap<String, String>,
}

impl Resolver {
    fn normalize(&mut self, source: &str, case: Case, location: &Location) -> Option<(String, Name)> {
        let canonical = match case {
            Case::Snake => to_snake_case(source),
            Case::Pascal => to_pascal_case(source),
        };
        if !is_valid_identifier(&canonical) {
            self.errors.push(ResolveError::InvalidIdentifier {
                name: source.to_string(),
                location: location.clone(),
            });
            return None;
        }
        let name = Name {
            source: source.to_string(),
            rust: escape_keyword(&canonical),
        };
        Some((canonical, name))
    }

    fn reserved(&mut self, scope: &str, name: &str, reason: impl Into<String>, location: &Location) {
        self.errors.push(ResolveError::ReservedName {
            scope: scope.to_string(),
            name: name.to_string(),
            reason: reason.into(),
            location: location.clone(),
        });
    }

    fn map_type(
        &mut self,
        ty: &TypeRef,
        type_names: &FxHashMap<&str, String>,
        module: &str,
        location: &Location,
    ) -> Option<CanonicalType> {
        let mapped = CanonicalType::map(ty, &|name: &str| type_names.get(name).cloned());
        if mapped.is_none() {
            let mut missing = None;
            ty.visit_named(&mut |t| {
                if let TypeRef::Record(name) | TypeRef::Enum(name) = t {
                    if missing.is_none() && !type_names.contains_key(name.as_str()) {
                        missing = Some(name.clone());
                    }
                }
            });
            self.errors.push(match missing {
                Some(name) => ResolveError::UnknownType {
                    name,
                    module: module.to_string(),
                    location: location.clone(),
                },
                None => ResolveError::MisplacedNotification {
                    location: location.clone(),
                },
            });
        }
        mapped
    }

    fn resolve_module(&mut self, spec: &ModuleSpec) -> Option<ResolvedModule> {
        let before = self.errors.len();
        if let Some(previous) = self.modules.get(&spec.name) {
            self.errors.push(ResolveError::DuplicateModule {
                name: spec.name.clone(),
                previous: previous.clone(),
                location: spec.location.clone(),
            });
            return None;
        }
        self.modules.insert(spec.name.clone(), spec.location.clone());

        let (_, module_name) = self.normalize(&spec.name, Case::Pascal, &spec.location)?;
        let generated = [
            module_name.rust.clone(),
            format!("{}Spec", module_name.rust),
            format!("{}Signal", module_name.rust),
        ];

        //----------------------------------------------------------------------
        // Type names
        //----------------------------------------------------------------------

        let type_scope = format!("the types of module `{}`", spec.name);
        let mut types = Scope::new(type_scope.clone());
        let mut type_names: FxHashMap<&str, String> = FxHashMap::default();
        let declared = spec
            .records
            .iter()
            .map(|r| (&r.name, &r.location))
            .chain(spec.enums.iter().map(|e| (&e.name, &e.location)));
        for (source, location) in declared {
            let Some((canonical, name)) = self.normalize(source, Case::Pascal, location) else {
                continue;
            };
            // Known even when rejected below, so uses do not pile up more errors.
            type_names.insert(source.as_str(), name.rust);
            if generated.iter().any(|g| *g == canonical) {
                self.reserved(&type_scope, source, "the generator defines a type with this name", location);
            } else if RESERVED_TYPES.iter().any(|r| *r == canonical) {
                self.reserved(&type_scope, source, "generated code uses this name for a built-in type", location);
            } else {
                types.claim(source, &canonical, location, &mut self.errors);
            }
        }

        //----------------------------------------------------------------------
        // Records and enums
        //----------------------------------------------------------------------

        let mut records = Vec::with_capacity(spec.records.len());
        for record in &spec.records {
            let Some(rust) = type_names.get(record.name.as_str()).cloned() else {
                continue;
            };
            let mut scope = Scope::new(format!("record `{}`", record.name));
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let Some((canonical, name)) = self.normalize(&field.name, Case::Snake, &field.location) else {
                    continue;
                };
                if !scope.claim(&field.name, &canonical, &field.location, &mut self.errors) {
                    continue;
                }
                if let Some(ty) = self.map_type(&field.ty, &type_names, &spec.name, &field.location) {
                    fields.push(ResolvedField { name, ty });
                }
            }
            records.push(ResolvedRecord {
                name: Name {
                    source: record.name.clone(),
                    rust,
                },
                fields,
                location: record.location.clone(),
            });
        }
        let records = self.order_records(records);

        let mut enums = Vec::with_capacity(spec.enums.len());
        for decl in &spec.enums {
            let Some(rust) = type_names.get(decl.name.as_str()).cloned() else {
                continue;
            };
            let mut scope = Scope::new(format!("enum `{}`", decl.name));
            let mut variants = Vec::with_capacity(decl.variants.len());
            for variant in &decl.variants {
                let Some((canonical, name)) = self.normalize(&variant.label, Case::Pascal, &variant.location) else {
                    continue;
                };
                if scope.claim(&variant.label, &canonical, &variant.location, &mut self.errors) {
                    variants.push(ResolvedVariant {
                        name,
                        value: variant.value.clone(),
                    });
                }
            }
            enums.push(ResolvedEnum {
                name: Name {
                    source: decl.name.clone(),
                    rust,
                },
                kind: decl.kind,
                variants,
                location: decl.location.clone(),
            });
        }

        //----------------------------------------------------------------------
        // Members: methods and notifications share one namespace
        //----------------------------------------------------------------------

        let member_scope = format!("module `{}`", spec.name);
        let mut members = Scope::new(member_scope.clone());

        let mut methods = Vec::with_capacity(spec.methods.len());
        for method in &spec.methods {
            let Some((canonical, name)) = self.normalize(&method.name, Case::Snake, &method.location) else {
                continue;
            };
            if RESERVED_METHODS.iter().any(|r| *r == canonical) {
                let reason = format!("the generated `{}` trait defines `{canonical}`", generated[1]);
                self.reserved(&member_scope, &method.name, reason, &method.location);
                continue;
            }
            if !members.claim(&method.name, &canonical, &method.location, &mut self.errors) {
                continue;
            }

            let mut scope = Scope::new(format!("the parameters of `{}`", method.name));
            let mut params = Vec::with_capacity(method.params.len());
            let mut complete = true;
            for param in &method.params {
                let resolved = self.normalize(&param.name, Case::Snake, &param.location).and_then(|(canonical, name)| {
                    if !scope.claim(&param.name, &canonical, &param.location, &mut self.errors) {
                        return None;
                    }
                    let ty = self.map_type(&param.ty, &type_names, &spec.name, &param.location)?;
                    Some(ResolvedParam { name, ty })
                });
                match resolved {
                    Some(param) => params.push(param),
                    None => complete = false,
                }
            }
            let returns = self.map_type(&method.return_type, &type_names, &spec.name, &method.location);
            if let (true, Some(returns)) = (complete, returns) {
                methods.push(ResolvedMethod {
                    name,
                    params,
                    is_async: returns.is_promise(),
                    returns,
                    location: method.location.clone(),
                });
            }
        }

        let mut notifications = Vec::with_capacity(spec.notifications.len());
        for notification in &spec.notifications {
            let Some((canonical, name)) = self.normalize(&notification.name, Case::Snake, &notification.location)
            else {
                continue;
            };
            if !members.claim(&notification.name, &canonical, &notification.location, &mut self.errors) {
                continue;
            }
            let payload = match &notification.payload {
                Some(ty) => match self.map_type(ty, &type_names, &spec.name, &notification.location) {
                    Some(ty) => Some(ty),
                    None => continue,
                },
                None => None,
            };
            notifications.push(ResolvedNotification {
                tag: escape_keyword(&to_pascal_case(&notification.name)),
                channel: Channel::for_payload(payload.as_ref()),
                name,
                payload,
                location: notification.location.clone(),
            });
        }

        if self.errors.len() > before {
            return None;
        }
        log::debug!(
            "Resolved module {} ({} method(s), {} notification(s))",
            spec.name,
            methods.len(),
            notifications.len()
        );
        Some(ResolvedModule {
            snake: to_snake_case(&spec.name),
            name: module_name,
            methods,
            records,
            enums,
            notifications,
            location: spec.location.clone(),
        })
    }

    /// Order records so each comes after the records it contains, reporting
    /// every containment cycle.
    fn order_records(&mut self, records: Vec<ResolvedRecord>) -> Vec<ResolvedRecord> {
        let index: FxHashMap<&str, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.rust.as_str(), i))
            .collect();
        let edges: Vec<Vec<usize>> = records
            .iter()
            .map(|r| {
                r.fields
                    .iter()
                    .flat_map(|f| f.ty.records())
                    .filter_map(|name| index.get(name).copied())
                    .collect()
            })
            .collect();

        let mut graph = RecordGraph {
            marks: vec![Mark::Unvisited; records.len()],
            edges,
            path: Vec::new(),
            order: Vec::with_capacity(records.len()),
            cycles: Vec::new(),
        };
        for node in 0..records.len() {
            graph.visit(node);
        }

        for cycle in &graph.cycles {
            self.errors.push(ResolveError::RecordCycle {
                cycle: cycle.iter().map(|&i| records[i].name.source.clone()).collect(),
                location: records[cycle[0]].location.clone(),
            });
        }

        let mut slots: Vec<Option<ResolvedRecord>> = records.into_iter().map(Some).collect();
        graph.order.into_iter().filter_map(|i| slots[i].take()).collect()
    }

    /// Add a resolved module's types to the project-wide lists. A type another
    /// module already defined is shared when identical and a conflict otherwise.
    fn share_types(&mut self, module: &ResolvedModule, model: &mut ProjectModel) {
        let owner = module.name.source.as_str();
        for generated in [module.name.rust.clone(), module.spec_trait(), module.signal_enum()] {
            self.claim_type(&generated, owner, &module.location);
        }
        for record in &module.records {
            let shared = model.records.iter().any(|r| r.same_shape(record));
            if !shared && self.claim_type(&record.name.rust, owner, &record.location) {
                model.records.push(record.clone());
            }
        }
        for decl in &module.enums {
            let shared = model.enums.iter().any(|e| e.same_shape(decl));
            if !shared && self.claim_type(&decl.name.rust, owner, &decl.location) {
                model.enums.push(decl.clone());
            }
        }
    }

    fn claim_type(&mut self, type_name: &str, module: &str, location: &Location) -> bool {
        match self.type_owners.get(type_name) {
            Some(other) => {
                self.errors.push(ResolveError::TypeConflict {
                    name: type_name.to_string(),
                    module: module.to_string(),
                    other: other.clone(),
                    location: location.clone(),
                });
                false
            }
            None => {
                self.type_owners.insert(type_name.to_string(), module.to_string());
                true
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Depth-first walk over record containment.
struct RecordGraph {
    marks: Vec<Mark>,
    edges: Vec<Vec<usize>>,
    path: Vec<usize>,
    order: Vec<usize>,
    cycles: Vec<Vec<usize>>,
}

impl RecordGraph {
    fn visit(&mut self, node: usize) {
        match self.marks[node] {
            Mark::Done => return,
            Mark::Visiting => {
                let start = self.path.iter().position(|&n| n == node).unwrap_or(0);
                let mut cycle = self.path[start..].to_vec();
                cycle.push(node);
                self.cycles.push(cycle);
                return;
            }
            Mark::Unvisited => {}
        }
        self.marks[node] = Mark::Visiting;
        self.path.push(node);
        for i in 0..self.edges[node].len() {
            let next = self.edges[node][i];
            self.visit(next);
        }
        self.path.pop();
        self.marks[node] = Mark::Done;
        self.order.push(node);
    }
}
