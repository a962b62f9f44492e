use crate::par::name::{Name, NameRef};
use std::fmt::{self, Display, Write};

/// Structural type of a name.
///
/// A [`Type::Reference`] is a lazy pointer to whatever type the referenced
/// name has at the time it is looked at, so filling in one name's type is
/// seen by every type referring to it.
#[derive(Clone, Debug, Default)]
pub enum Type {
    #[default]
    Untyped,
    Base(String),
    Chan(Box<Self>),
    Composite(Vec<Self>),
    Reference(NameRef),
}

impl Type {
    pub fn chan(elem: Self) -> Self {
        Self::Chan(Box::new(elem))
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Self::Untyped)
    }

    /// Number of values carried by a channel with this element type.
    pub fn arity(&self) -> usize {
        match self {
            Self::Composite(elems) => elems.len(),
            _ => 1,
        }
    }

    /// Element types, one per value carried.
    pub fn elems(&self) -> Vec<Self> {
        match self {
            Self::Composite(elems) => elems.clone(),
            other => vec![other.clone()],
        }
    }

    /// Follows a chain of references to the first non-reference type.
    ///
    /// A dropped name or a chain that loops back on itself reads as untyped.
    pub fn deref(&self) -> Self {
        let mut seen = vec![];
        let mut typ = self.clone();
        loop {
            let target = match &typ {
                Self::Reference(target) => target.clone(),
                _ => return typ,
            };
            if seen.contains(&target.addr()) {
                return Self::Untyped;
            }
            seen.push(target.addr());
            typ = match target.upgrade() {
                Some(name) => name.typ(),
                None => return Self::Untyped,
            };
        }
    }

    /// The name at the end of a chain of references, if there is one.
    pub fn terminal(&self) -> Option<Name> {
        let mut seen = vec![];
        let mut last = None;
        let mut typ = self.clone();
        while let Self::Reference(target) = &typ {
            if seen.contains(&target.addr()) {
                return None;
            }
            seen.push(target.addr());
            let name = target.upgrade()?;
            typ = name.typ();
            last = Some(name);
        }
        last
    }

    /// Whether following this type's references passes through `name`.
    pub fn refers_to(&self, name: &Name) -> bool {
        let mut seen = vec![];
        let mut typ = self.clone();
        while let Self::Reference(target) = &typ {
            if target.points_to(name) {
                return true;
            }
            if seen.contains(&target.addr()) {
                return false;
            }
            seen.push(target.addr());
            typ = match target.upgrade() {
                Some(next) => next.typ(),
                None => return false,
            };
        }
        false
    }

    /// Structural equality after dereferencing.
    ///
    /// Base types compare by name, channels by element, composites pairwise.
    /// Two untyped sides are equal.
    pub fn equals(&self, other: &Self) -> bool {
        equals(self, other, &mut vec![])
    }

    fn write(&self, f: &mut impl Write, visiting: &mut Vec<*const ()>) -> fmt::Result {
        match self {
            Self::Untyped => write!(f, "interface{{}}"),
            Self::Base(name) => write!(f, "{}", name),
            Self::Chan(elem) => {
                write!(f, "chan ")?;
                elem.write(f, visiting)
            }
            Self::Composite(elems) => {
                write!(f, "struct{{")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ";")?;
                    }
                    write!(f, "e{} ", i)?;
                    elem.write(f, visiting)?;
                }
                write!(f, "}}")
            }
            Self::Reference(target) => {
                let addr = target.addr();
                let name = match target.upgrade() {
                    Some(name) if !visiting.contains(&addr) => name,
                    _ => return write!(f, "interface{{}}"),
                };
                visiting.push(addr);
                let result = name.typ().write(f, visiting);
                visiting.pop();
                result
            }
        }
    }
}

type Visit = (*const (), *const ());

fn equals(t: &Type, u: &Type, visiting: &mut Vec<Visit>) -> bool {
    if let (Type::Reference(a), Type::Reference(b)) = (t, u) {
        let pair = (a.addr(), b.addr());
        if pair.0 == pair.1 || visiting.contains(&pair) {
            return true;
        }
        visiting.push(pair);
        let result = equals(&t.deref(), &u.deref(), visiting);
        visiting.pop();
        return result;
    }
    let (t, u) = (t.deref(), u.deref());
    match (&t, &u) {
        (Type::Untyped, Type::Untyped) => true,
        (Type::Base(a), Type::Base(b)) => a == b,
        (Type::Chan(a), Type::Chan(b)) => equals(a, b, visiting),
        (Type::Composite(a), Type::Composite(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| equals(a, b, visiting))
        }
        _ => false,
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, &mut vec![])
    }
}
