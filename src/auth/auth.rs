use crate::error::AppError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// Caller identity, placed in request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ErrorUnauthorized("Missing token"))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if self.is_hr_or_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR/Admin only"))
        }
    }

    pub fn is_hr_or_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Hr)
    }

    /// Employee an attendance action is recorded for.
    ///
    /// Employees always act for their own profile; admins, HR and kiosks may
    /// name any employee.
    pub fn acting_employee(&self, requested: Option<u64>) -> Result<u64, AppError> {
        match (requested, self.employee_id) {
            (Some(id), Some(own)) if id == own => Ok(id),
            (Some(id), _) if self.role.acts_for_others() => Ok(id),
            (Some(_), _) => Err(AppError::Forbidden(
                "Cannot record attendance for another employee",
            )),
            (None, Some(own)) => Ok(own),
            (None, None) => Err(AppError::Forbidden("No employee profile")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "jane".to_string(),
            role,
            employee_id,
        }
    }

    #[test]
    fn employees_act_for_themselves() {
        let jane = user(Role::Employee, Some(7));
        assert_eq!(jane.acting_employee(None).unwrap(), 7);
        assert_eq!(jane.acting_employee(Some(7)).unwrap(), 7);
        assert!(matches!(
            jane.acting_employee(Some(8)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn kiosk_must_name_the_employee() {
        let kiosk = user(Role::Kiosk, None);
        assert_eq!(kiosk.acting_employee(Some(8)).unwrap(), 8);
        assert!(matches!(
            kiosk.acting_employee(None),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn role_guards() {
        assert!(user(Role::Admin, None).require_admin().is_ok());
        assert!(user(Role::Hr, None).require_admin().is_err());
        assert!(user(Role::Hr, None).require_hr_or_admin().is_ok());
        assert!(user(Role::Kiosk, None).require_hr_or_admin().is_err());
    }
}
