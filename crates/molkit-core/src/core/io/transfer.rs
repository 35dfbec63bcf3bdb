use crate::core::models::array::{
    ATOM_NAME_WIDTH, CHAIN_NAME_WIDTH, ELEMENT_WIDTH, NameColumn, RESIDUE_NAME_WIDTH,
    StorageKind,
};
use crate::core::models::atom::{AtomRecord, AtomView};
use crate::core::models::ids::{AtomIndex, ChainIndex, ModelIndex, ResidueIndex};
use crate::core::models::metadata::UnitCell;
use crate::core::models::secondary::SecondaryStructure;
use crate::core::models::structure::Structure;
use crate::core::models::topology::BondOrder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Field '{field}' has length {found}, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Entry {index} of '{field}' refers to missing parent {parent}")]
    InvalidParent {
        field: &'static str,
        index: usize,
        parent: u32,
    },
    #[error("Residue {index} has no atoms")]
    EmptyResidue { index: usize },
    #[error("Bond {index} is invalid: atoms {atom1}-{atom2}, order {order}")]
    InvalidBond {
        index: usize,
        atom1: u32,
        atom2: u32,
        order: u32,
    },
    #[error("Frame {index} has length {found}, expected {expected}")]
    FrameLength {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// A whole structure flattened into parallel arrays.
///
/// Per-atom arrays are indexed by local atom index; names are stored in
/// fixed-width, zero-padded byte fields, with longer or non-ASCII names
/// carried whole beside them. The hierarchy is encoded by parent
/// keys (atom → residue → chain → model) and rebuilt by replaying them in
/// order. Bonds are `[atom1, atom2, order]` triples.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransferRecord {
    pub name: String,
    pub title: String,
    pub id: String,
    pub path: String,
    pub packed: bool,

    pub model_count: u32,
    pub chain_model: Vec<u32>,
    pub chain_names: NameColumn<CHAIN_NAME_WIDTH>,

    pub residue_chain: Vec<u32>,
    pub residue_numbers: Vec<i32>,
    pub residue_names: NameColumn<RESIDUE_NAME_WIDTH>,
    pub residue_secondary_structure: Vec<u8>,

    pub atom_residue: Vec<u32>,
    pub global_indices: Vec<u64>,
    pub positions: Vec<f32>,
    pub atom_names: NameColumn<ATOM_NAME_WIDTH>,
    pub atom_chain_names: NameColumn<CHAIN_NAME_WIDTH>,
    pub elements: NameColumn<ELEMENT_WIDTH>,
    pub serials: Vec<i32>,
    pub covalent_radii: Vec<f32>,
    pub vdw_radii: Vec<f32>,
    pub b_factors: Vec<f32>,
    /// One tag per atom; a blank marks an atom without one.
    pub alt_locs: Vec<char>,
    pub hetero: Vec<u8>,

    pub bonds: Vec<u32>,
    pub frames: Vec<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cell: Option<UnitCell>,
}

fn check_len(field: &'static str, found: usize, expected: usize) -> Result<(), TransferError> {
    if found == expected {
        Ok(())
    } else {
        Err(TransferError::LengthMismatch {
            field,
            expected,
            found,
        })
    }
}

fn check_names<const W: usize>(
    field: &'static str,
    column: &NameColumn<W>,
    rows: usize,
) -> Result<(), TransferError> {
    column
        .check_rows(rows)
        .map_err(|(expected, found)| TransferError::LengthMismatch {
            field,
            expected,
            found,
        })
}

fn check_parent(
    field: &'static str,
    index: usize,
    parent: u32,
    count: usize,
) -> Result<usize, TransferError> {
    let parent_index = parent as usize;
    if parent_index < count {
        Ok(parent_index)
    } else {
        Err(TransferError::InvalidParent {
            field,
            index,
            parent,
        })
    }
}

impl TransferRecord {
    pub fn atom_count(&self) -> usize {
        self.atom_residue.len()
    }

    /// Flattens a structure.
    pub fn encode(structure: &Structure) -> Self {
        let atom_count = structure.atom_count();
        let mut record = Self {
            name: structure.name.clone(),
            title: structure.title.clone(),
            id: structure.id.clone(),
            path: structure.path.clone(),
            packed: structure.storage_kind() == StorageKind::Packed,
            model_count: structure.model_count() as u32,
            unit_cell: structure.unit_cell.clone(),
            frames: structure.frames().to_vec(),
            positions: Vec::with_capacity(atom_count * 3),
            ..Self::default()
        };

        for chain in structure.chains() {
            record.chain_model.push(chain.model().get() as u32);
            record.chain_names.push(chain.name());
        }
        for residue in structure.residues() {
            record.residue_chain.push(residue.chain().get() as u32);
            record.residue_numbers.push(residue.number());
            record.residue_names.push(residue.name());
            record
                .residue_secondary_structure
                .push(residue.secondary_structure().code() as u8);
        }
        for atom in structure.atoms() {
            let position = atom.position();
            record.atom_residue.push(atom.residue().get() as u32);
            record.global_indices.push(atom.global_index());
            record
                .positions
                .extend_from_slice(&[position.x as f32, position.y as f32, position.z as f32]);
            record.atom_names.push(atom.name());
            record.atom_chain_names.push(atom.chain_name());
            record.elements.push(atom.element());
            record.serials.push(atom.serial());
            record.covalent_radii.push(atom.covalent_radius());
            record.vdw_radii.push(atom.vdw_radius());
            record.b_factors.push(atom.b_factor());
            record.alt_locs.push(atom.alt_loc().unwrap_or(' '));
            record.hetero.push(u8::from(atom.is_hetero()));
        }
        for (_, bond) in structure.bonds().iter() {
            record.bonds.extend_from_slice(&[
                bond.atom1.get() as u32,
                bond.atom2.get() as u32,
                u32::from(bond.order.as_u8()),
            ]);
        }
        record
    }

    fn validate(&self) -> Result<(), TransferError> {
        let chains = self.chain_model.len();
        let residues = self.residue_chain.len();
        let atoms = self.atom_residue.len();

        check_names("chain-names", &self.chain_names, chains)?;
        check_len("residue-numbers", self.residue_numbers.len(), residues)?;
        check_names("residue-names", &self.residue_names, residues)?;
        check_len(
            "residue-secondary-structure",
            self.residue_secondary_structure.len(),
            residues,
        )?;
        check_len("global-indices", self.global_indices.len(), atoms)?;
        check_len("positions", self.positions.len(), atoms * 3)?;
        check_names("atom-names", &self.atom_names, atoms)?;
        check_names("atom-chain-names", &self.atom_chain_names, atoms)?;
        check_names("elements", &self.elements, atoms)?;
        check_len("serials", self.serials.len(), atoms)?;
        check_len("covalent-radii", self.covalent_radii.len(), atoms)?;
        check_len("vdw-radii", self.vdw_radii.len(), atoms)?;
        check_len("b-factors", self.b_factors.len(), atoms)?;
        check_len("alt-locs", self.alt_locs.len(), atoms)?;
        check_len("hetero", self.hetero.len(), atoms)?;
        if self.bonds.len() % 3 != 0 {
            return Err(TransferError::LengthMismatch {
                field: "bonds",
                expected: self.bonds.len() - self.bonds.len() % 3,
                found: self.bonds.len(),
            });
        }
        for (index, frame) in self.frames.iter().enumerate() {
            if frame.len() != atoms * 3 {
                return Err(TransferError::FrameLength {
                    index,
                    expected: atoms * 3,
                    found: frame.len(),
                });
            }
        }
        Ok(())
    }

    /// Rebuilds the structure, validating every array first.
    ///
    /// # Errors
    ///
    /// Returns a [`TransferError`] for arrays of the wrong length, parent
    /// keys pointing past their level, residues without atoms, or bonds
    /// with invalid atoms or orders.
    pub fn decode(&self) -> Result<Structure, TransferError> {
        self.validate()?;

        let storage = if self.packed {
            StorageKind::Packed
        } else {
            StorageKind::Objects
        };
        let mut structure = Structure::with_capacity(&self.name, storage, self.atom_count());
        structure.title = self.title.clone();
        structure.id = self.id.clone();
        structure.path = self.path.clone();
        structure.unit_cell = self.unit_cell.clone();

        for _ in 0..self.model_count {
            structure.add_model();
        }
        for (index, &model) in self.chain_model.iter().enumerate() {
            let model = check_parent("chain-model", index, model, self.model_count as usize)?;
            let name = self.chain_names.get(index);
            structure.add_chain(ModelIndex(model), name);
        }

        let mut residue_atoms = vec![0usize; self.residue_chain.len()];
        for (index, &parent) in self.atom_residue.iter().enumerate() {
            let residue = check_parent("atom-residue", index, parent, residue_atoms.len())?;
            residue_atoms[residue] += 1;
        }
        if let Some(index) = residue_atoms.iter().position(|&count| count == 0) {
            return Err(TransferError::EmptyResidue { index });
        }

        for (index, &chain) in self.residue_chain.iter().enumerate() {
            let chain = check_parent("residue-chain", index, chain, self.chain_model.len())?;
            let name = self.residue_names.get(index);
            structure.add_residue(ChainIndex(chain), self.residue_numbers[index], name);
        }

        for (index, &parent) in self.atom_residue.iter().enumerate() {
            let residue = ResidueIndex(parent as usize);
            let owner = structure.residue(residue);
            let record = AtomRecord {
                model_index: owner.model().get(),
                chain_name: self.atom_chain_names.get(index).to_string(),
                residue_number: owner.number(),
                residue_name: owner.name().to_string(),
                atom_name: self.atom_names.get(index).to_string(),
                x: self.positions[3 * index],
                y: self.positions[3 * index + 1],
                z: self.positions[3 * index + 2],
                element: self.elements.get(index).to_string(),
                covalent_radius: Some(self.covalent_radii[index]),
                vdw_radius: Some(self.vdw_radii[index]),
                hetero: self.hetero[index] != 0,
                serial: self.serials[index],
                b_factor: self.b_factors[index],
                alt_loc: Some(self.alt_locs[index]).filter(|c| !c.is_whitespace()),
            };
            structure.add_atom(residue, &record, self.global_indices[index]);
        }

        for (index, &code) in self.residue_secondary_structure.iter().enumerate() {
            let ss = SecondaryStructure::from_code(code as char);
            if ss != SecondaryStructure::Unassigned {
                structure.set_residue_secondary_structure(ResidueIndex(index), ss);
            }
        }

        let atoms = self.atom_count();
        for (index, triple) in self.bonds.chunks_exact(3).enumerate() {
            let (a, b, order) = (triple[0], triple[1], triple[2]);
            let order_code = u8::try_from(order).ok().and_then(BondOrder::from_u8);
            match order_code {
                Some(bond_order) if (a as usize) < atoms && (b as usize) < atoms && a != b => {
                    structure.add_bond(AtomIndex(a as usize), AtomIndex(b as usize), bond_order);
                }
                _ => {
                    return Err(TransferError::InvalidBond {
                        index,
                        atom1: a,
                        atom2: b,
                        order,
                    });
                }
            }
        }

        for frame in &self.frames {
            structure.frames_mut().push(frame.clone());
        }
        structure.refresh_geometry();

        debug!(
            name = %structure.name,
            atoms = structure.atom_count(),
            bonds = structure.bond_count(),
            "Decoded transfer record"
        );
        Ok(structure)
    }
}
