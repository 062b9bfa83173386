use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use crate::models::TokenType;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::{BoxBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use tracing::debug;

/// Resolves the bearer token on `req` into an `AuthUser`.
fn authenticate(req: &ServiceRequest, secret: &str) -> Result<AuthUser, String> {
    let header_value = req
        .headers()
        .get("Authorization")
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header encoding")?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or("Authorization header must start with Bearer")?;

    let claims = verify_token(token, secret).map_err(|e| format!("Invalid or expired token: {e}"))?;

    if claims.token_type != TokenType::Access {
        return Err("Refresh tokens cannot be used for API calls".to_string());
    }

    let role = Role::from_id(claims.role).ok_or("Invalid role")?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
    })
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    match authenticate(&req, &config.jwt_secret) {
        Ok(auth_user) => {
            req.extensions_mut().insert(auth_user);
            Ok(next.call(req).await?.map_into_boxed_body())
        }
        Err(reason) => {
            debug!(path = %req.path(), reason = %reason, "Rejected unauthenticated request");
            let resp = HttpResponse::Unauthorized().json(json!({
                "error": "unauthorized",
                "message": reason,
            }));
            Ok(req.into_response(resp))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::testing::sign;
    use actix_web::middleware::from_fn;
    use actix_web::{App, http::StatusCode, test, web};

    async fn whoami(auth: AuthUser) -> HttpResponse {
        HttpResponse::Ok().json(json!({ "employee_id": auth.employee_id }))
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(Data::new(Config::for_tests("secret")))
                    .service(
                        web::scope("/api")
                            .wrap(from_fn(auth_middleware))
                            .route("/me", web::get().to(whoami)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_header_is_rejected() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn access_token_reaches_handler() {
        let app = app!();
        let token = sign(3, Some(7), TokenType::Access, "secret");
        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["employee_id"], 7);
    }

    #[actix_web::test]
    async fn refresh_token_is_rejected() {
        let app = app!();
        let token = sign(3, Some(7), TokenType::Refresh, "secret");
        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn unknown_role_is_rejected() {
        let app = app!();
        let token = sign(9, Some(7), TokenType::Access, "secret");
        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
