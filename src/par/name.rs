use super::{
    error::{Error, Result},
    types::Type,
};
use crate::location::Span;
use std::{
    cell::RefCell,
    hash::{Hash, Hasher},
    rc::{Rc, Weak},
};

/// Whether a name stands for a channel/value or for a variable bound by an
/// input prefix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Sort {
    #[default]
    Name,
    Var,
}

#[derive(Debug)]
struct Slot {
    ident: String,
    sort: Sort,
    typ: Type,
    hint: Option<String>,
    constant: bool,
    span: Option<Span>,
}

/// A shared handle to a name.
///
/// Cloning the handle aliases the same name: renaming, sorting or typing one
/// clone is observed through all of them. Equality and hashing are by
/// identity; compare labels with [`is_same_name`].
#[derive(Clone)]
pub struct Name(Rc<RefCell<Slot>>);

/// Non-owning pointer to a name, held by [`Type::Reference`].
#[derive(Clone)]
pub struct NameRef(Weak<RefCell<Slot>>);

impl Name {
    fn with_slot(slot: Slot) -> Self {
        Self(Rc::new(RefCell::new(slot)))
    }

    pub fn new(ident: impl Into<String>) -> Self {
        Self::with_slot(Slot {
            ident: ident.into(),
            sort: Sort::Name,
            typ: Type::Untyped,
            hint: None,
            constant: false,
            span: None,
        })
    }

    /// A name annotated with a base type, as in `(new a:int)`.
    pub fn hinted(ident: impl Into<String>, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        Self::with_slot(Slot {
            ident: ident.into(),
            sort: Sort::Name,
            typ: Type::Base(hint.clone()),
            hint: Some(hint),
            constant: false,
            span: None,
        })
    }

    /// A name that refuses every mutation.
    pub fn constant(ident: impl Into<String>) -> Self {
        Self::with_slot(Slot {
            ident: ident.into(),
            sort: Sort::Name,
            typ: Type::Untyped,
            hint: None,
            constant: true,
            span: None,
        })
    }

    /// Attaches the source position the name was parsed from.
    pub fn located(self, span: Span) -> Self {
        self.0.borrow_mut().span = Some(span);
        self
    }

    pub fn span(&self) -> Option<Span> {
        self.0.borrow().span
    }

    pub fn ident(&self) -> String {
        self.0.borrow().ident.clone()
    }

    pub fn sort(&self) -> Sort {
        self.0.borrow().sort
    }

    pub fn typ(&self) -> Type {
        self.0.borrow().typ.clone()
    }

    pub fn hint(&self) -> Option<String> {
        self.0.borrow().hint.clone()
    }

    pub fn is_constant(&self) -> bool {
        self.0.borrow().constant
    }

    fn update(&self, f: impl FnOnce(&mut Slot)) -> Result<()> {
        let mut slot = self.0.borrow_mut();
        if slot.constant {
            return Err(Error::ImmutableName(slot.ident.clone()));
        }
        f(&mut slot);
        Ok(())
    }

    pub fn set_ident(&self, ident: impl Into<String>) -> Result<()> {
        let ident = ident.into();
        self.update(|slot| slot.ident = ident)
    }

    pub fn set_sort(&self, sort: Sort) -> Result<()> {
        self.update(|slot| slot.sort = sort)
    }

    pub fn set_type(&self, typ: Type) -> Result<()> {
        self.update(|slot| slot.typ = typ)
    }

    /// Identity comparison: both handles point at the same name.
    pub fn same(&self, other: &Name) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> NameRef {
        NameRef(Rc::downgrade(&self.0))
    }

    /// A type pointing at this name's current type.
    pub fn reference(&self) -> Type {
        Type::Reference(self.downgrade())
    }

    pub fn free_names(&self) -> Vec<Name> {
        match self.sort() {
            Sort::Name => vec![self.clone()],
            Sort::Var => vec![],
        }
    }

    pub fn free_vars(&self) -> Vec<Name> {
        match self.sort() {
            Sort::Name => vec![],
            Sort::Var => vec![self.clone()],
        }
    }
}

impl NameRef {
    pub fn upgrade(&self) -> Option<Name> {
        self.0.upgrade().map(Name)
    }

    pub fn points_to(&self, name: &Name) -> bool {
        core::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&name.0))
    }

    pub(crate) fn addr(&self) -> *const () {
        self.0.as_ptr() as *const ()
    }
}

/// Label comparison, used where identity is not yet established.
pub fn is_same_name(a: &Name, b: &Name) -> bool {
    a.0.borrow().ident == b.0.borrow().ident
}

/// Holds when the name's own free-name set is exactly itself.
pub fn is_free_name(name: &Name) -> bool {
    let free = name.free_names();
    free.len() == 1 && is_same_name(&free[0], name)
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state)
    }
}

impl core::fmt::Display for Name {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let slot = self.0.borrow();
        if slot.sort == Sort::Var {
            write!(f, "_")?;
        }
        write!(f, "{}", slot.ident)?;
        if !matches!(slot.typ, Type::Untyped) {
            write!(f, ":{}", slot.typ)?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for Name {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Name({})", self)
    }
}

impl core::fmt::Debug for NameRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.upgrade() {
            Some(name) => write!(f, "&{}", name.ident()),
            None => write!(f, "&<dropped>"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clones_alias() {
        let a = Name::new("a");
        let alias = a.clone();
        alias.set_ident("b").unwrap();
        alias.set_sort(Sort::Var).unwrap();
        assert_eq!(a.ident(), "b");
        assert_eq!(a.sort(), Sort::Var);
        assert!(a.same(&alias));
        assert!(!a.same(&Name::new("b")));
        assert!(is_same_name(&a, &Name::new("b")));
    }

    #[test]
    fn constant_names_refuse_mutation() {
        let c = Name::constant("c");
        assert!(matches!(c.set_ident("d"), Err(Error::ImmutableName(ref n)) if n == "c"));
        assert!(c.set_sort(Sort::Var).is_err());
        assert!(c.set_type(Type::Base("int".into())).is_err());
        assert_eq!(c.ident(), "c");
    }

    #[test]
    fn free_names_follow_sort() {
        let x = Name::new("x");
        assert_eq!(x.free_names().len(), 1);
        assert!(x.free_vars().is_empty());
        assert!(is_free_name(&x));

        x.set_sort(Sort::Var).unwrap();
        assert!(x.free_names().is_empty());
        assert_eq!(x.free_vars().len(), 1);
        assert!(!is_free_name(&x));
    }

    #[test]
    fn display() {
        let a = Name::hinted("a", "int");
        assert_eq!(a.to_string(), "a:int");
        assert_eq!(a.hint().as_deref(), Some("int"));
        let x = Name::new("x");
        x.set_sort(Sort::Var).unwrap();
        assert_eq!(x.to_string(), "_x");
    }

    #[test]
    fn dropped_reference_does_not_upgrade() {
        let r = {
            let a = Name::new("a");
            a.downgrade()
        };
        assert!(r.upgrade().is_none());
    }
}
