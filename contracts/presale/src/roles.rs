/// Closed set of permissions understood by the engine.
///
/// `DefaultAdmin` administers every role, itself included. `Owner` runs the
/// sale: it creates rounds and may rescue custodied assets.
#[derive(Debug, PartialEq, Eq, Clone, Copy, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Role {
    DefaultAdmin,
    Owner,
}

impl Role {
    /// Role whose holders may grant and revoke `self`.
    pub fn admin_role(self) -> Role {
        Role::DefaultAdmin
    }
}
