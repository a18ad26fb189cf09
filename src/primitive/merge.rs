// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::Slot;

/// An `feMerge` filter primitive.
///
/// Inputs are painted in order, one `feMergeNode` per input.
#[derive(Clone, Default, Debug)]
pub struct Merge {
    inputs: Vec<Slot>,
}

impl Merge {
    /// The `feMergeNode` inputs, in painting order.
    pub fn inputs(&self) -> &[Slot] {
        &self.inputs
    }

    /// Replaces the inputs.
    pub fn set_inputs(&mut self, inputs: Vec<Slot>) {
        self.inputs = inputs;
    }

    /// Appends an `feMergeNode`.
    pub fn push_input(&mut self, slot: Slot) {
        self.inputs.push(slot);
    }
}
