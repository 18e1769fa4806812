use vbinit_image::Opcode;

use super::Dispatcher;

#[test]
fn every_opcode_is_registered() {
    let d = Dispatcher::shared();

    assert_eq!(d.len(), Opcode::ALL.len());
    for &opcode in Opcode::ALL {
        let desc = d.lookup(opcode.id()).unwrap();
        assert_eq!(desc.opcode, opcode);
        assert_eq!(desc.name, opcode.name());
    }
}

#[test]
fn unassigned_ids_miss() {
    let d = Dispatcher::shared();

    assert!(d.lookup(0xee).is_none());
    assert!(d.lookup(0x00).is_none());
}

#[test]
fn iteration_is_in_id_order() {
    let ids: Vec<u8> = Dispatcher::shared().iter().map(|d| d.id).collect();

    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn shared_is_built_once() {
    assert!(std::ptr::eq(Dispatcher::shared(), Dispatcher::shared()));
}
