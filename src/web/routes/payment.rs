use axum::{
    Router,
    extract::{Query, State},
    middleware,
    response::IntoResponse,
    routing::get,
};

use crate::{
    integrations::{Payer, PaymentStatus},
    model::{
        CrudRepository, ResourceTyped,
        entity::{Plan, Subscription, UserEntity},
    },
    web::{
        ApiResponse, AppState, MessageResponse, RequestContext, WebError, WebResult,
        dto::{
            account::SubscriptionResponse,
            payment::{CheckoutLinks, PaymentDoneQuery},
        },
        error::ErrorResponse,
        middlewares, validation,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/payment_checkout", get(checkout_handler))
        .route("/payment_done", get(payment_done_handler))
        .route("/payment_denied", get(payment_denied_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/payment_checkout",
    description = "Creates checkout links for every plan",
    responses(
        (status = 200, description = "Checkout links", body = ApiResponse<CheckoutLinks>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 502, description = "Payment provider failed", body = ErrorResponse),
    ),
    tag = "payment",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
async fn checkout_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;

    let payer = Payer {
        email: found.email().to_string(),
        full_name: found.full_name().to_string(),
    };
    let payments = &state.services().payments;
    let (link_monthly, link_annual, link_lifetime) = tokio::try_join!(
        payments.create_preference(Plan::Monthly, &payer),
        payments.create_preference(Plan::Annual, &payer),
        payments.create_preference(Plan::Lifetime, &payer),
    )
    .map_err(WebError::upstream)?;

    Ok(ApiResponse::ok(
        "Payment preferences created.",
        CheckoutLinks {
            link_monthly,
            link_annual,
            link_lifetime,
        },
    ))
}

#[utoipa::path(
    get,
    path = "/payment_done",
    params(PaymentDoneQuery),
    description = "Confirms an approved payment and starts the subscription",
    responses(
        (status = 200, description = "Subscription active", body = ApiResponse<SubscriptionResponse>),
        (status = 400, description = "Unknown plan, missing id, payment not approved or made for another plan", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Payment belongs to another user", body = ErrorResponse),
        (status = 502, description = "Payment provider failed", body = ErrorResponse),
    ),
    tag = "payment",
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
async fn payment_done_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(query): Query<PaymentDoneQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let plan: Plan = validation::required("plan", query.plan.as_deref())?
        .parse()
        .map_err(|_| WebError::invalid_field("plan", "expected monthly, annual or lifetime"))?;
    let payment_id = validation::required("payment_id", query.payment_id.as_deref())?;
    if !payment_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(WebError::invalid_field("payment_id", "unexpected characters"));
    }

    let existing = Subscription::find_by_payment_id(state.pool(), user, payment_id)
        .await
        .map_err(WebError::from_db(Subscription::get_resource_type()))?;
    if let Some(existing) = existing {
        if existing.user_id() != user.user_id() {
            return Err(WebError::resource_forbidden(Subscription::get_resource_type()));
        }
        return Ok(ApiResponse::ok(
            "Payment already processed.",
            SubscriptionResponse::from(&existing),
        ));
    }

    let payment = state
        .services()
        .payments
        .payment(payment_id)
        .await
        .map_err(WebError::upstream)?;
    if payment.status != PaymentStatus::Approved {
        return Err(WebError::resource_bad_request(
            Subscription::get_resource_type(),
            "payment not approved",
        ));
    }
    // the plan paid for is the one on the checkout, not the one in the query
    if payment.plan != Some(plan) {
        tracing::warn!(user_id = %user.user_id(), %plan, paid = ?payment.plan, "Plan does not match payment.");
        return Err(WebError::resource_bad_request(
            Subscription::get_resource_type(),
            "plan does not match payment",
        ));
    }

    let subscription = Subscription::create(state.pool(), user, user.user_id(), plan, Some(payment_id))
        .await
        .map_err(WebError::from_db(Subscription::get_resource_type()))?;

    let mut found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;
    found
        .set_subscriber(state.pool(), true)
        .await
        .map_err(WebError::from_db(UserEntity::get_resource_type()))?;

    tracing::info!(user_id = %user.user_id(), %plan, "Subscription started.");
    Ok(ApiResponse::ok(
        "Purchase completed.",
        SubscriptionResponse::from(&subscription),
    ))
}

#[utoipa::path(
    get,
    path = "/payment_denied",
    responses((status = 200, description = "Purchase denied", body = MessageResponse)),
    tag = "payment"
)]
async fn payment_denied_handler() -> impl IntoResponse {
    MessageResponse::ok("Purchase denied.")
}
