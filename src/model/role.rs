#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    /// Shared attendance terminal at the office entrance.
    Kiosk = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::Kiosk),
            _ => None,
        }
    }

    /// May record attendance on behalf of any employee.
    pub fn acts_for_others(self) -> bool {
        matches!(self, Role::Admin | Role::Hr | Role::Kiosk)
    }
}
