use slotmap::new_key_type;

new_key_type! {
    pub struct GroupId;
    pub struct ParticleId;
    pub struct PortId;
}
