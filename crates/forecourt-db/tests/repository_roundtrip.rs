//! Repository integration tests against an in-memory database.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use forecourt_core::types::{
    Account, AccountStatus, AccountType, EventRef, LedgerTransaction, MovementType, Product,
    ProductType, RefKind, StockMovement, Supplier, TransactionType,
};
use forecourt_core::Money;
use forecourt_db::{Database, DbConfig};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn account(name: &str, opening: i64) -> Account {
    let now = Utc::now();
    Account {
        id: Uuid::new_v4().to_string(),
        account_type: AccountType::Bank,
        name: name.into(),
        opening_balance: Money::from_rupees(opening),
        current_balance: Money::from_rupees(opening),
        status: AccountStatus::Active,
        created_at: now,
        updated_at: now,
        version: 1,
    }
}

fn product(name: &str, stock: i64, avg_cost: i64) -> Product {
    let now = Utc::now();
    let stock = Decimal::from(stock);
    let avg = Money::from_rupees(avg_cost);
    Product {
        id: Uuid::new_v4().to_string(),
        name: name.into(),
        product_type: ProductType::Fuel,
        unit: "litre".into(),
        current_stock: stock,
        weighted_avg_cost: avg,
        minimum_stock_level: Decimal::from(100),
        tank_capacity: Some(Decimal::from(20_000)),
        selling_price: Money::from_rupees(avg_cost + 15),
        stock_value: avg * stock,
        is_active: true,
        created_at: now,
        updated_at: now,
        version: 1,
    }
}

#[tokio::test]
async fn account_round_trip_and_cas() {
    let db = test_db().await;
    let acct = account("Bank Current", 2_000);

    let mut tx = db.begin().await.unwrap();
    db.accounts().insert(&mut tx, &acct).await.unwrap();
    tx.commit().await.unwrap();

    let loaded = db.accounts().get_by_id(&acct.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "Bank Current");
    assert_eq!(loaded.current_balance, Money::from_rupees(2_000));
    assert_eq!(loaded.version, 1);

    // CAS with the right version succeeds and bumps the version
    let mut tx = db.begin().await.unwrap();
    let ok = db
        .accounts()
        .cas_update_balance(&mut tx, &acct.id, 1, Money::from_rupees(1_500), Utc::now())
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert!(ok);

    let loaded = db.accounts().get_by_id(&acct.id).await.unwrap().unwrap();
    assert_eq!(loaded.current_balance, Money::from_rupees(1_500));
    assert_eq!(loaded.version, 2);

    // CAS with a stale version writes nothing
    let mut tx = db.begin().await.unwrap();
    let ok = db
        .accounts()
        .cas_update_balance(&mut tx, &acct.id, 1, Money::from_rupees(999), Utc::now())
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert!(!ok);

    let loaded = db.accounts().get_by_id(&acct.id).await.unwrap().unwrap();
    assert_eq!(loaded.current_balance, Money::from_rupees(1_500));
}

#[tokio::test]
async fn product_decimal_fields_round_trip_exactly() {
    let db = test_db().await;
    let mut prod = product("Petrol (Super)", 0, 0);
    // A repeating-decimal average must survive storage untouched
    prod.current_stock = Decimal::from(1_500);
    prod.weighted_avg_cost = Money::new(Decimal::from(155_000) / Decimal::from(1_500));
    prod.stock_value = prod.weighted_avg_cost * prod.current_stock;

    let mut tx = db.begin().await.unwrap();
    db.products().insert(&mut tx, &prod).await.unwrap();
    tx.commit().await.unwrap();

    let loaded = db.products().get_by_id(&prod.id).await.unwrap().unwrap();
    assert_eq!(loaded.weighted_avg_cost, prod.weighted_avg_cost);
    assert_eq!(loaded.stock_value, prod.stock_value);
    assert_eq!(loaded.tank_capacity, Some(Decimal::from(20_000)));
}

#[tokio::test]
async fn movement_reference_is_unique() {
    let db = test_db().await;
    let prod = product("Diesel", 1_000, 278);

    let mut tx = db.begin().await.unwrap();
    db.products().insert(&mut tx, &prod).await.unwrap();
    tx.commit().await.unwrap();

    let movement = StockMovement {
        id: Uuid::new_v4().to_string(),
        product_id: prod.id.clone(),
        movement_type: MovementType::Purchase,
        quantity: Decimal::from(500),
        unit_price: Money::from_rupees(278),
        avg_cost_after: Money::from_rupees(278),
        balance_after: Decimal::from(1_500),
        reference: Some(EventRef::new(RefKind::PurchaseOrder, "po-77")),
        note: None,
        created_at: Utc::now(),
    };

    let mut tx = db.begin().await.unwrap();
    db.movements().append(&mut tx, &movement).await.unwrap();
    tx.commit().await.unwrap();

    // Same reference, new row id: the idempotency guard rejects it
    let replay = StockMovement {
        id: Uuid::new_v4().to_string(),
        ..movement
    };
    let mut tx = db.begin().await.unwrap();
    let err = db.movements().append(&mut tx, &replay).await.unwrap_err();
    assert!(err.is_unique_violation(), "got {err:?}");
}

#[tokio::test]
async fn transaction_log_window_queries() {
    let db = test_db().await;
    let from_acct = account("Bank", 10_000);
    let to_acct = account("Till", 1_000);
    let supplier = Supplier {
        id: Uuid::new_v4().to_string(),
        name: "PSO Depot".into(),
        account_balance: Money::from_rupees(1_500),
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        version: 1,
    };

    let mut tx = db.begin().await.unwrap();
    db.accounts().insert(&mut tx, &from_acct).await.unwrap();
    db.accounts().insert(&mut tx, &to_acct).await.unwrap();
    db.suppliers().insert(&mut tx, &supplier).await.unwrap();
    tx.commit().await.unwrap();

    let before = Utc::now();

    let row = LedgerTransaction {
        id: Uuid::new_v4().to_string(),
        transaction_type: TransactionType::Transfer,
        amount: Money::from_rupees(500),
        from_account_id: Some(from_acct.id.clone()),
        to_account_id: None,
        supplier_id: Some(supplier.id.clone()),
        reference: Some(EventRef::new(RefKind::Transfer, "tr-1")),
        description: Some("supplier payment".into()),
        created_at: Utc::now(),
    };
    let mut tx = db.begin().await.unwrap();
    db.transactions().append(&mut tx, &row).await.unwrap();
    tx.commit().await.unwrap();

    let after = Utc::now();

    let in_window = db
        .transactions()
        .list_in_window(before, after)
        .await
        .unwrap();
    assert_eq!(in_window.len(), 1);
    assert_eq!(
        in_window[0].signed_amount_for(&from_acct.id),
        Some(Money::from_rupees(-500))
    );

    let for_account = db
        .transactions()
        .list_for_account(&from_acct.id)
        .await
        .unwrap();
    assert_eq!(for_account.len(), 1);

    let for_supplier = db
        .transactions()
        .list_for_supplier_in_window(&supplier.id, before, after)
        .await
        .unwrap();
    assert_eq!(for_supplier.len(), 1);
    assert_eq!(for_supplier[0].reference.as_ref().unwrap().id, "tr-1");

    // An account not on the row sees nothing
    let other = db
        .transactions()
        .list_for_account(&to_acct.id)
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn rollback_leaves_no_trace() {
    let db = test_db().await;
    let acct = account("Bank", 1_000);

    {
        let mut tx = db.begin().await.unwrap();
        db.accounts().insert(&mut tx, &acct).await.unwrap();
        // dropped without commit → rolled back
    }

    assert!(db.accounts().get_by_id(&acct.id).await.unwrap().is_none());
}
