#![no_main]

//! Fuzz target for context algebra
//!
//! Narrowing, combining and ignoring must stay consistent with `satisfies`.

use arbitrary::Arbitrary;
use contextual_injector::{Context, Qualifier, QualifierType, Qualifiers};
use libfuzzer_sys::fuzz_target;

const KINDS: [QualifierType; 4] = [
    QualifierType::new("locale"),
    QualifierType::new("region"),
    QualifierType::new("tenant"),
    QualifierType::new("channel"),
];

#[derive(Debug, Arbitrary)]
struct Entry {
    kind: u8,
    value: String,
}

impl Entry {
    fn qualifier(&self) -> Qualifier {
        KINDS[self.kind as usize % KINDS.len()].value(self.value.as_str())
    }
}

#[derive(Debug, Arbitrary)]
enum Filter {
    None,
    All,
    Only(Vec<u8>),
}

impl Filter {
    fn qualifiers(&self) -> Qualifiers {
        match self {
            Filter::None => Qualifiers::None,
            Filter::All => Qualifiers::All,
            Filter::Only(kinds) => {
                Qualifiers::only(kinds.iter().map(|kind| KINDS[*kind as usize % KINDS.len()]))
            }
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    base: Vec<Entry>,
    other: Vec<Entry>,
    filter: Filter,
    ignored: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let base: Context = input.base.iter().map(Entry::qualifier).collect();
    let other: Context = input.other.iter().map(Entry::qualifier).collect();
    let accepted = input.filter.qualifiers();

    // Narrowing only removes
    let narrowed = base.accept(&accepted);
    assert!(base.satisfies(&narrowed));
    assert!(narrowed.len() <= base.len());
    assert_eq!(narrowed.accept(&accepted), narrowed);
    for qualifier in narrowed.iter() {
        assert!(accepted.accepts(qualifier.kind()));
    }

    // The right-hand side wins on conflicts
    let combined = base.combine(&other);
    assert!(combined.satisfies(&other));
    for qualifier in base.iter() {
        if other.get(qualifier.kind()).is_none() {
            assert!(combined.contains(&qualifier));
        }
    }

    // Insertion order never matters for equality
    let reversed: Context = input.base.iter().rev().fold(Context::new(), |context, entry| {
        if context.get(entry.qualifier().kind()).is_some() {
            context
        } else {
            context.with(entry.qualifier())
        }
    });
    let last_wins: Context = input.base.iter().map(Entry::qualifier).collect();
    assert_eq!(reversed, last_wins);

    let ignored: Vec<QualifierType> = input
        .ignored
        .iter()
        .map(|kind| KINDS[*kind as usize % KINDS.len()])
        .collect();
    let remaining = base.ignore(&ignored);
    assert!(base.satisfies(&remaining));
    for kind in &ignored {
        assert!(remaining.get(*kind).is_none());
    }
});
