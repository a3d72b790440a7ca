//! The type store: interned types compared by id.
//!
//! Primitives occupy fixed ids created with the store. Lists, refinements,
//! and function types are interned structurally; user records are nominal,
//! registered once by declaration and looked up by name. After interning,
//! type equality is `TypeId` equality.

use num_bigint::BigInt;
use rustc_hash::FxHashMap;

use twine_common::ids::{StringId, TypeId};
use twine_common::intern::StringInterner;

/// `i32` — fixed primitive id.
pub const TY_I32: TypeId = TypeId(0);
/// `i64` — fixed primitive id.
pub const TY_I64: TypeId = TypeId(1);
/// `f32` — fixed primitive id.
pub const TY_F32: TypeId = TypeId(2);
/// `f64` — fixed primitive id.
pub const TY_F64: TypeId = TypeId(3);
/// The unit/no-value type — fixed primitive id.
pub const TY_NONE: TypeId = TypeId(4);
/// The poison type carried by failed checks — fixed primitive id.
/// Downstream consumers must not emit code for it.
pub const TY_INVALID: TypeId = TypeId(5);

/// The built-in primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prim {
    I32,
    I64,
    F32,
    F64,
    None,
    Invalid,
}

impl Prim {
    /// Canonical source-level name.
    pub fn name(self) -> &'static str {
        match self {
            Prim::I32 => "i32",
            Prim::I64 => "i64",
            Prim::F32 => "f32",
            Prim::F64 => "f64",
            Prim::None => "none",
            Prim::Invalid => "invalid",
        }
    }
}

/// One field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: StringId,
    pub ty: TypeId,
    pub index: u32,
}

/// The stored shape of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeData {
    Prim(Prim),
    /// An integer primitive narrowed by inclusive bounds.
    Refined {
        base: TypeId,
        min: Option<BigInt>,
        max: Option<BigInt>,
    },
    /// A fixed-size list.
    List { elem: TypeId, size: u32 },
    /// A nominal record with ordered, uniquely-named fields.
    Record { name: StringId, fields: Vec<Field> },
    /// A function signature.
    Func { params: Vec<TypeId>, ret: TypeId },
}

/// The type store. Append-only; every registration interns.
#[derive(Debug)]
pub struct TypeStore {
    types: Vec<TypeData>,
    lists: FxHashMap<(TypeId, u32), TypeId>,
    refined: FxHashMap<(TypeId, Option<BigInt>, Option<BigInt>), TypeId>,
    funcs: FxHashMap<(Vec<TypeId>, TypeId), TypeId>,
    records: FxHashMap<StringId, TypeId>,
}

impl TypeStore {
    /// Create a store pre-seeded with the fixed primitives.
    pub fn new() -> Self {
        let types = vec![
            TypeData::Prim(Prim::I32),
            TypeData::Prim(Prim::I64),
            TypeData::Prim(Prim::F32),
            TypeData::Prim(Prim::F64),
            TypeData::Prim(Prim::None),
            TypeData::Prim(Prim::Invalid),
        ];
        Self {
            types,
            lists: FxHashMap::default(),
            refined: FxHashMap::default(),
            funcs: FxHashMap::default(),
            records: FxHashMap::default(),
        }
    }

    fn push(&mut self, data: TypeData) -> TypeId {
        let id = TypeId::new(self.types.len());
        self.types.push(data);
        id
    }

    /// Look up a type by id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this store.
    pub fn get(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    /// Number of registered types.
    pub fn count(&self) -> usize {
        self.types.len()
    }

    // ── Registration ───────────────────────────────────────────────────

    /// Intern a fixed-size list type.
    pub fn register_list(&mut self, elem: TypeId, size: u32) -> TypeId {
        if let Some(&id) = self.lists.get(&(elem, size)) {
            return id;
        }
        let id = self.push(TypeData::List { elem, size });
        self.lists.insert((elem, size), id);
        id
    }

    /// Intern a refined integer type.
    pub fn register_refined(
        &mut self,
        base: TypeId,
        min: Option<BigInt>,
        max: Option<BigInt>,
    ) -> TypeId {
        let key = (base, min.clone(), max.clone());
        if let Some(&id) = self.refined.get(&key) {
            return id;
        }
        let id = self.push(TypeData::Refined { base, min, max });
        self.refined.insert(key, id);
        id
    }

    /// Intern a function type.
    pub fn register_func(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        let key = (params.clone(), ret);
        if let Some(&id) = self.funcs.get(&key) {
            return id;
        }
        let id = self.push(TypeData::Func { params, ret });
        self.funcs.insert(key, id);
        id
    }

    /// Register a nominal record type. Returns `None` when the name is
    /// already taken (the first registration stays authoritative).
    pub fn register_record(&mut self, name: StringId, fields: Vec<Field>) -> Option<TypeId> {
        if self.records.contains_key(&name) {
            return None;
        }
        let id = self.push(TypeData::Record { name, fields });
        self.records.insert(name, id);
        Some(id)
    }

    /// Look up a record type by name.
    pub fn record_by_name(&self, name: StringId) -> Option<TypeId> {
        self.records.get(&name).copied()
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Whether the type is an integer (directly or through refinement).
    pub fn is_integer(&self, id: TypeId) -> bool {
        match self.get(id) {
            TypeData::Prim(Prim::I32 | Prim::I64) => true,
            TypeData::Refined { base, .. } => self.is_integer(*base),
            _ => false,
        }
    }

    /// Whether the type is a float primitive.
    pub fn is_float(&self, id: TypeId) -> bool {
        matches!(self.get(id), TypeData::Prim(Prim::F32 | Prim::F64))
    }

    /// Whether the type is a fixed-size list.
    pub fn is_list(&self, id: TypeId) -> bool {
        matches!(self.get(id), TypeData::List { .. })
    }

    /// Whether the type is a user record.
    pub fn is_record(&self, id: TypeId) -> bool {
        matches!(self.get(id), TypeData::Record { .. })
    }

    /// Whether the type is a refined integer.
    pub fn is_refined(&self, id: TypeId) -> bool {
        matches!(self.get(id), TypeData::Refined { .. })
    }

    /// Whether the type is a function signature.
    pub fn is_func(&self, id: TypeId) -> bool {
        matches!(self.get(id), TypeData::Func { .. })
    }

    /// Element type and size of a list.
    pub fn list_info(&self, id: TypeId) -> Option<(TypeId, u32)> {
        match self.get(id) {
            TypeData::List { elem, size } => Some((*elem, *size)),
            _ => None,
        }
    }

    /// Parameters and return type of a function type, cloned out.
    pub fn func_info(&self, id: TypeId) -> Option<(Vec<TypeId>, TypeId)> {
        match self.get(id) {
            TypeData::Func { params, ret } => Some((params.clone(), *ret)),
            _ => None,
        }
    }

    /// Refinement bounds, cloned out.
    pub fn constraints(&self, id: TypeId) -> Option<(Option<BigInt>, Option<BigInt>)> {
        match self.get(id) {
            TypeData::Refined { min, max, .. } => Some((min.clone(), max.clone())),
            _ => None,
        }
    }

    /// The ordered fields of a record.
    ///
    /// # Panics
    ///
    /// Panics if the id is not a record type.
    pub fn fields(&self, id: TypeId) -> &[Field] {
        match self.get(id) {
            TypeData::Record { fields, .. } => fields,
            other => panic!("fields() on non-record type {other:?}"),
        }
    }

    /// Look up a record field by name.
    pub fn field(&self, id: TypeId, name: StringId) -> Option<&Field> {
        match self.get(id) {
            TypeData::Record { fields, .. } => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    /// The primitive a value of this type lowers to: refinements delegate
    /// to their base, everything else is itself.
    pub fn wasm_type(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            TypeData::Refined { base, .. } => *base,
            _ => id,
        }
    }

    /// Interned types are structurally canonical, so equality is id
    /// equality.
    pub fn are_equal(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }

    /// Canonical printed form of a type.
    pub fn name(&self, id: TypeId, interner: &StringInterner) -> String {
        match self.get(id) {
            TypeData::Prim(p) => p.name().to_string(),
            TypeData::Refined { base, min, max } => {
                let mut bounds = Vec::new();
                if let Some(min) = min {
                    bounds.push(format!("min={min}"));
                }
                if let Some(max) = max {
                    bounds.push(format!("max={max}"));
                }
                format!("{}<{}>", self.name(*base, interner), bounds.join(", "))
            }
            TypeData::List { elem, size } => {
                format!("{}[{}]", self.name(*elem, interner), size)
            }
            TypeData::Record { name, .. } => interner.get(*name).to_string(),
            TypeData::Func { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| self.name(*p, interner)).collect();
                format!("({}) -> {}", params.join(", "), self.name(*ret, interner))
            }
        }
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_have_fixed_ids() {
        let types = TypeStore::new();
        assert_eq!(types.get(TY_I32), &TypeData::Prim(Prim::I32));
        assert_eq!(types.get(TY_I64), &TypeData::Prim(Prim::I64));
        assert_eq!(types.get(TY_F32), &TypeData::Prim(Prim::F32));
        assert_eq!(types.get(TY_F64), &TypeData::Prim(Prim::F64));
        assert_eq!(types.get(TY_NONE), &TypeData::Prim(Prim::None));
        assert_eq!(types.get(TY_INVALID), &TypeData::Prim(Prim::Invalid));
    }

    #[test]
    fn list_types_intern_structurally() {
        let mut types = TypeStore::new();
        let a = types.register_list(TY_I32, 3);
        let b = types.register_list(TY_I32, 3);
        let c = types.register_list(TY_I32, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(types.list_info(a), Some((TY_I32, 3)));
    }

    #[test]
    fn refined_types_intern_by_base_and_bounds() {
        let mut types = TypeStore::new();
        let a = types.register_refined(TY_I32, Some(BigInt::from(0)), Some(BigInt::from(100)));
        let b = types.register_refined(TY_I32, Some(BigInt::from(0)), Some(BigInt::from(100)));
        let c = types.register_refined(TY_I32, Some(BigInt::from(1)), Some(BigInt::from(100)));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(types.is_refined(a));
        assert!(types.is_integer(a));
        assert_eq!(types.wasm_type(a), TY_I32);
    }

    #[test]
    fn func_types_intern_by_signature() {
        let mut types = TypeStore::new();
        let a = types.register_func(vec![TY_I32, TY_I32], TY_I32);
        let b = types.register_func(vec![TY_I32, TY_I32], TY_I32);
        let c = types.register_func(vec![TY_I32], TY_I32);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(types.func_info(a), Some((vec![TY_I32, TY_I32], TY_I32)));
    }

    #[test]
    fn records_are_nominal_and_register_once() {
        let mut types = TypeStore::new();
        let mut interner = StringInterner::new();
        let point = interner.intern("Point");
        let x = interner.intern("x");
        let y = interner.intern("y");
        let fields = vec![
            Field { name: x, ty: TY_I32, index: 0 },
            Field { name: y, ty: TY_I32, index: 1 },
        ];
        let id = types.register_record(point, fields.clone()).unwrap();
        assert_eq!(types.record_by_name(point), Some(id));
        assert!(types.register_record(point, fields).is_none());

        let field = types.field(id, y).unwrap();
        assert_eq!(field.index, 1);
        assert_eq!(field.ty, TY_I32);
        assert_eq!(types.field(id, interner.intern("z")), None);
    }

    #[test]
    fn are_equal_is_an_equivalence() {
        let mut types = TypeStore::new();
        let a = types.register_list(TY_I64, 2);
        let b = types.register_list(TY_I64, 2);
        assert!(types.are_equal(a, a));
        assert!(types.are_equal(a, b) == types.are_equal(b, a));
        assert!(types.are_equal(a, b));
    }

    #[test]
    fn type_names_are_canonical() {
        let mut types = TypeStore::new();
        let mut interner = StringInterner::new();
        assert_eq!(types.name(TY_I32, &interner), "i32");

        let list = types.register_list(TY_F64, 3);
        assert_eq!(types.name(list, &interner), "f64[3]");

        let refined =
            types.register_refined(TY_I32, Some(BigInt::from(0)), Some(BigInt::from(100)));
        assert_eq!(types.name(refined, &interner), "i32<min=0, max=100>");

        let func = types.register_func(vec![TY_I32, TY_I64], TY_F32);
        assert_eq!(types.name(func, &interner), "(i32, i64) -> f32");

        let point = interner.intern("Point");
        let rec = types.register_record(point, vec![]).unwrap();
        assert_eq!(types.name(rec, &interner), "Point");
    }

    #[test]
    fn equal_ids_print_equal_names() {
        let mut types = TypeStore::new();
        let interner = StringInterner::new();
        let a = types.register_list(TY_I32, 5);
        let b = types.register_list(TY_I32, 5);
        assert_eq!(types.name(a, &interner), types.name(b, &interner));
    }
}
