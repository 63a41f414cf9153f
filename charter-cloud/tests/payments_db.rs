//! Payment persistence against a real Postgres.
//!
//! Run with `DATABASE_URL` pointing at a disposable database:
//! `cargo test -p charter-cloud --test payments_db -- --ignored`

use shared::models::PaymentStatus;
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use charter_cloud::api::payments::apply_gateway_status;
use charter_cloud::config::Config;
use charter_cloud::db;
use charter_cloud::db::payments::NewPayment;
use charter_cloud::state::AppState;
use charter_cloud::storage::PhotoStorage;

async fn state() -> AppState {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url).await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let config = Config {
        database_url,
        http_port: 0,
        environment: "development".into(),
        jwt_secret: "payments-db-secret".into(),
        stripe_secret_key: "sk_test".into(),
        stripe_webhook_secret: "whsec_test".into(),
        stripe_api_base: "http://127.0.0.1:1".into(),
        stripe_captain_pro_price_id: "price_monthly".into(),
        stripe_captain_pro_yearly_price_id: "price_yearly".into(),
        billing_success_url: "http://localhost/ok".into(),
        billing_cancel_url: "http://localhost/cancel".into(),
        payment_currency: "usd".into(),
        platform_fee_bps: 1000,
        weather_api_base: "http://127.0.0.1:1".into(),
        marine_api_base: "http://127.0.0.1:1".into(),
        s3_bucket: "photos".into(),
        s3_region: "us-east-1".into(),
        s3_endpoint: Some("http://127.0.0.1:9000".into()),
        s3_access_key_id: Some("AKIDEXAMPLE".into()),
        s3_secret_access_key: Some("secret".into()),
        upload_url_ttl_secs: 900,
    };
    let photos = PhotoStorage::with_static_credentials(
        &config.s3_bucket,
        &config.s3_region,
        config.s3_endpoint.as_deref(),
        "AKIDEXAMPLE",
        "secret",
        config.upload_url_ttl_secs,
    );
    AppState::from_parts(pool, &config, photos)
}

/// Captain, participant, trip and a pending booking; returns (booking, participant)
async fn seed_booking(pool: &PgPool) -> (i64, i64) {
    let now = now_millis();
    let captain = snowflake_id();
    let participant = snowflake_id();
    for (id, role) in [(captain, "captain"), (participant, "participant")] {
        sqlx::query(
            "INSERT INTO users (id, email, hashed_password, name, role, created_at)
             VALUES ($1, $2, 'x', 'Test', $3, $4)",
        )
        .bind(id)
        .bind(format!("{id}@example.com"))
        .bind(role)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
    }

    let trip = snowflake_id();
    sqlx::query(
        "INSERT INTO trips (id, captain_id, title, location, departure_at, duration_hours,
                            max_participants, price_per_seat_cents, created_at, updated_at)
         VALUES ($1, $2, 'Reef run', 'Key West', $3, 6, 6, 12500, $4, $4)",
    )
    .bind(trip)
    .bind(captain)
    .bind(now + 7 * 86_400_000)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    let booking = snowflake_id();
    sqlx::query(
        "INSERT INTO bookings (id, trip_id, user_id, seats, created_at, updated_at)
         VALUES ($1, $2, $3, 2, $4, $4)",
    )
    .bind(booking)
    .bind(trip)
    .bind(participant)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
    (booking, participant)
}

fn new_payment<'a>(booking_id: i64, user_id: i64, intent: &'a str) -> NewPayment<'a> {
    NewPayment {
        id: snowflake_id(),
        booking_id,
        user_id,
        amount_cents: 25_000,
        currency: "usd",
        status: PaymentStatus::Pending,
        gateway_intent_id: intent,
        now: now_millis(),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn stale_write_returns_the_current_row() {
    let state = state().await;
    let (booking, user) = seed_booking(&state.pool).await;
    let intent = format!("pi_{}", snowflake_id());
    let stale = db::payments::create(&state.pool, &new_payment(booking, user, &intent))
        .await
        .unwrap();

    // Another writer (the webhook) settles the payment first
    let settled = db::payments::update_status_if(
        &state.pool,
        stale.id,
        PaymentStatus::Pending,
        PaymentStatus::Succeeded,
        None,
        now_millis(),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(settled.paid_at.is_some());

    let applied = apply_gateway_status(&state, stale, "processing", None)
        .await
        .unwrap();
    assert!(!applied.updated);
    assert_eq!(applied.payment.status, "succeeded");
    assert_eq!(applied.payment.paid_at, settled.paid_at);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn one_live_payment_per_booking() {
    let state = state().await;
    let (booking, user) = seed_booking(&state.pool).await;
    let first_intent = format!("pi_{}", snowflake_id());
    let second_intent = format!("pi_{}", snowflake_id());

    let first = db::payments::create(&state.pool, &new_payment(booking, user, &first_intent))
        .await
        .unwrap();
    let duplicate =
        db::payments::create(&state.pool, &new_payment(booking, user, &second_intent)).await;
    match duplicate {
        Err(sqlx::Error::Database(e)) => assert!(e.is_unique_violation()),
        other => panic!("expected a unique violation, got {other:?}"),
    }

    db::payments::update_status_if(
        &state.pool,
        first.id,
        PaymentStatus::Pending,
        PaymentStatus::Cancelled,
        None,
        now_millis(),
    )
    .await
    .unwrap()
    .unwrap();
    let retry = db::payments::create(&state.pool, &new_payment(booking, user, &second_intent))
        .await
        .unwrap();
    assert_eq!(
        db::payments::find_live_for_booking(&state.pool, booking)
            .await
            .unwrap()
            .map(|p| p.id),
        Some(retry.id)
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn refund_keeps_the_paid_at_bucket() {
    let state = state().await;
    let (booking, user) = seed_booking(&state.pool).await;
    let intent = format!("pi_{}", snowflake_id());
    let payment = db::payments::create(&state.pool, &new_payment(booking, user, &intent))
        .await
        .unwrap();
    let paid_at = 1_700_000_000_000;
    let settled = db::payments::update_status_if(
        &state.pool,
        payment.id,
        PaymentStatus::Pending,
        PaymentStatus::Succeeded,
        None,
        paid_at,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(settled.paid_at, Some(paid_at));

    let refunded = db::payments::mark_refunded(&state.pool, &intent, 5_000, paid_at + 86_400_000 * 40)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refunded.status, "refunded");
    assert_eq!(refunded.paid_at, Some(paid_at));
    assert!(refunded.updated_at > paid_at);
}
