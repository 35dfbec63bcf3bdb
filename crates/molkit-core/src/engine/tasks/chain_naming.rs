use crate::core::models::ids::{AtomIndex, ModelIndex};
use crate::core::models::structure::Structure;
use crate::engine::context::ProcessingContext;
use tracing::{info, instrument, warn};

/// Names handed out to fibers, in order.
pub const CHAIN_NAMES: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// True when no chain of the structure carries a name.
pub fn needs_names(structure: &Structure) -> bool {
    structure.chains().iter().all(|chain| chain.name().is_empty())
}

/// Gives every fiber its own chain name when the input had none.
///
/// Names are written onto the atoms of each fiber; the counter restarts for
/// every model and wraps around after the last name. Atoms outside any
/// fiber keep an empty chain name. Structures with at least one named chain
/// are left alone.
///
/// Returns the number of fibers named.
#[instrument(skip_all, name = "chain_naming_task")]
pub fn run(structure: &mut Structure, context: &ProcessingContext) -> usize {
    if !needs_names(structure) {
        return 0;
    }

    let mut fibers: Vec<(ModelIndex, Vec<AtomIndex>)> = Vec::new();
    structure.each_fiber_with(None, &context.criteria(), |fiber| {
        let model = fiber.structure().chain(fiber.chain()).model();
        fibers.push((model, fiber.atom_indices()));
    });

    let mut current_model = None;
    let mut next = 0;
    let mut wrapped = false;
    for (model, atoms) in &fibers {
        if current_model != Some(*model) {
            current_model = Some(*model);
            next = 0;
        }
        let name = char::from(CHAIN_NAMES[next]).to_string();
        for &atom in atoms {
            structure.set_atom_chain_name(atom, &name);
        }
        next += 1;
        if next == CHAIN_NAMES.len() {
            if !wrapped {
                warn!(model = %model, "Out of chain names; reusing names from the start.");
                wrapped = true;
            }
            next = 0;
        }
    }

    info!(fibers = fibers.len(), "Assigned chain names.");
    fibers.len()
}
