//! Opcode id to descriptor lookup.

use std::sync::OnceLock;

use vbinit_image::Opcode;

/// A dispatchable opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    pub id: u8,
    pub name: &'static str,
    pub opcode: Opcode,
}

/// Flat 256-slot table, built once and shared.
#[derive(Debug)]
pub struct Dispatcher {
    slots: [Option<OpcodeDescriptor>; 256],
}

impl Dispatcher {
    fn build() -> Self {
        let mut slots = [None; 256];
        for &opcode in Opcode::ALL {
            slots[usize::from(opcode.id())] = Some(OpcodeDescriptor {
                id: opcode.id(),
                name: opcode.name(),
                opcode,
            });
        }
        Self { slots }
    }

    /// The process-wide dispatcher.
    pub fn shared() -> &'static Dispatcher {
        static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();
        DISPATCHER.get_or_init(Dispatcher::build)
    }

    #[inline]
    pub fn lookup(&self, id: u8) -> Option<&OpcodeDescriptor> {
        self.slots[usize::from(id)].as_ref()
    }

    /// Registered descriptors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &OpcodeDescriptor> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
