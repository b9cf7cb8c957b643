// lib/src/query_compiler/compiler.rs

use models::errors::{GraphResult, ValidationError};
use models::{unique_index, EdgeDescriptor, PropertySelector};

use super::operation::{Clear, CompiledOperation, Filter, Projection, Target, Update};

/// Translates a descriptor into a single persistence operation.
///
/// Pure: no I/O, same descriptor in, same operation out. A descriptor
/// without `find` addresses exactly one edge and compiles to an upsert
/// located by the edge's uniqueness key; with `find` it compiles to a
/// read-only search.
///
/// # Errors
/// `ValidationError::MissingEndpoint` when a single-edge descriptor lacks
/// `src` or `dest`, `ValidationError::UpdateOnSearch` when a search carries
/// `set` or `remove`.
pub fn compile(descriptor: &EdgeDescriptor) -> GraphResult<CompiledOperation> {
    let mut filter = Filter {
        src: descriptor.src,
        dest: descriptor.dest,
        ..Filter::default()
    };

    if let Some(find) = &descriptor.find {
        filter.props = find.iter().map(|(name, expr)| (*name, expr.clone())).collect();
    }

    let projection = match &descriptor.get {
        None => Projection::IdentityOnly,
        Some(PropertySelector::All) => Projection::AllProps,
        Some(PropertySelector::Named(names)) => Projection::Props(names.clone()),
    };

    let mut update = Update::default();
    if let Some(set) = &descriptor.set {
        update.assign = set.clone();
    }
    if let Some(remove) = &descriptor.remove {
        update.clear = match remove {
            PropertySelector::All => Clear::All,
            PropertySelector::Named(names) => Clear::Paths(names.clone()),
        };
    }

    let returns_document = descriptor.get.is_some();

    if descriptor.find.is_some() {
        if descriptor.set.is_some() || descriptor.remove.is_some() {
            return Err(ValidationError::UpdateOnSearch.into());
        }
        // A search pinned to both endpoints can only ever hit one slot.
        if let (Some(src), Some(dest)) = (descriptor.src, descriptor.dest) {
            filter.unique_index = Some(unique_index(&src, &dest));
        }
        return Ok(CompiledOperation {
            target: Target::Many,
            filter,
            projection,
            update: None,
            returns_document,
        });
    }

    let src = descriptor.src.ok_or(ValidationError::MissingEndpoint("src"))?;
    let dest = descriptor.dest.ok_or(ValidationError::MissingEndpoint("dest"))?;
    filter.unique_index = Some(unique_index(&src, &dest));

    Ok(CompiledOperation {
        target: Target::Single,
        filter,
        projection,
        update: Some(update),
        returns_document,
    })
}
