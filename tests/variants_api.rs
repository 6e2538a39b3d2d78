mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

async fn seed_variant(app: &TestApp, stock: i64) -> (i64, i64) {
    let product = app
        .create("/products", json!({"name": "Straight Jeans", "sku": "SJ", "price": 80}))
        .await;
    let variant = app
        .create(
            "/variants",
            json!({
                "variantId": "SJ-32",
                "sku": "SJ-32",
                "productId": product,
                "stock": stock,
                "choices": {"size": "32"}
            }),
        )
        .await;
    (product, variant)
}

#[tokio::test]
async fn subtract_floors_at_zero() {
    let app = TestApp::new().await;
    let (_, variant) = seed_variant(&app, 3).await;

    let (status, body) = app
        .patch(&format!("/variants/{variant}/stock"), json!({"stock": 5, "operation": "subtract"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock"], json!(0));
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn add_and_set_are_exact() {
    let app = TestApp::new().await;
    let (_, variant) = seed_variant(&app, 3).await;
    let path = format!("/variants/{variant}/stock");

    let (_, body) = app.patch(&path, json!({"stock": 4, "operation": "add"})).await;
    assert_eq!(body["data"]["stock"], json!(7));

    let (_, body) = app.patch(&path, json!({"stock": 2, "operation": "subtract"})).await;
    assert_eq!(body["data"]["stock"], json!(5));

    let (_, body) = app.patch(&path, json!({"stock": 11})).await;
    assert_eq!(body["data"]["stock"], json!(11));

    let (_, body) = app.patch(&path, json!({"stock": 0, "operation": "set"})).await;
    assert_eq!(body["data"]["stock"], json!(0));
}

#[tokio::test]
async fn add_that_would_overflow_is_rejected() {
    let app = TestApp::new().await;
    let (_, variant) = seed_variant(&app, 5).await;
    let path = format!("/variants/{variant}/stock");

    let (status, body) = app
        .patch(&path, json!({"stock": i64::MAX, "operation": "add"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], json!("ValidationError"));

    let (status, body) = app.get(&format!("/variants/{variant}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["stock"], json!(5));

    let (status, body) = app
        .patch(&path, json!({"stock": i64::MAX - 5, "operation": "add"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["stock"], json!(i64::MAX));

    let (status, _) = app
        .patch("/variants/999/stock", json!({"stock": 1, "operation": "add"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stock_update_rejects_bad_input() {
    let app = TestApp::new().await;
    let (_, variant) = seed_variant(&app, 3).await;
    let path = format!("/variants/{variant}/stock");

    for body in [
        json!({}),
        json!({"operation": "add"}),
        json!({"stock": -1}),
        json!({"stock": 1, "operation": "double"}),
    ] {
        let (status, response) = app.patch(&path, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response["error"], json!("ValidationError"), "{body}");
    }

    let (status, _) = app.patch("/variants/999/stock", json!({"stock": 1})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn color_delete_is_guarded_by_variants() {
    let app = TestApp::new().await;
    let color = app.create("/colors", json!({"name": "Indigo", "hexCode": "#4B0082"})).await;
    let style = app.create("/styles", json!({"name": "Slim", "fitType": "skinny"})).await;
    let product = app
        .create("/products", json!({"name": "Jeans", "sku": "J", "price": 50}))
        .await;
    let variant = app
        .create(
            "/variants",
            json!({
                "variantId": "J-IND",
                "sku": "J-IND",
                "productId": product,
                "colorId": color,
                "styleId": style
            }),
        )
        .await;

    let (status, body) = app.delete(&format!("/colors/{color}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("ConflictError"));

    let (status, _) = app.delete(&format!("/styles/{style}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete(&format!("/variants/{variant}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.delete(&format!("/colors/{color}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete(&format!("/styles/{style}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn detail_and_list_expand_relations() {
    let app = TestApp::new().await;
    let color = app.create("/colors", json!({"name": "Black"})).await;
    let collection = app.create("/collections", json!({"name": "Essentials"})).await;
    let (product, variant) = seed_variant(&app, 1).await;

    let (status, body) = app
        .put(
            &format!("/variants/{variant}"),
            json!({"colorId": color, "collectionIds": [collection]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["product"]["id"], json!(product));
    assert_eq!(body["data"]["color"]["name"], json!("Black"));
    assert_eq!(body["data"]["collections"][0]["name"], json!("Essentials"));
    assert_eq!(body["data"]["choices"], json!({"size": "32"}));

    let (status, body) = app.get(&format!("/variants?colorId={color}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], json!(1));
    assert_eq!(
        body["data"][0]["product"],
        json!({"id": product, "name": "Straight Jeans", "slug": "straight-jeans", "sku": "SJ", "price": 80.0})
    );
    assert_eq!(body["data"][0]["collections"], json!([{"id": collection, "name": "Essentials"}]));

    let (status, body) = app.get(&format!("/collections/{collection}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["variants"][0]["variantId"], json!("SJ-32"));
    assert_eq!(body["data"]["products"], json!([]));

    let (_, body) = app.put(&format!("/variants/{variant}"), json!({"collectionIds": []})).await;
    assert_eq!(body["data"]["collections"], json!([]));
}

#[tokio::test]
async fn variants_of_a_product() {
    let app = TestApp::new().await;
    let (product, _) = seed_variant(&app, 0).await;
    let other = app
        .create("/products", json!({"name": "Shorts", "sku": "SH", "price": 30}))
        .await;
    app.create(
        "/variants",
        json!({"variantId": "SH-M", "sku": "SH-M", "productId": other, "stock": 4}),
    )
    .await;

    let (status, body) = app.get(&format!("/variants/product/{product}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], json!(1));
    assert_eq!(body["data"][0]["variantId"], json!("SJ-32"));

    let (_, body) = app.get(&format!("/variants/product/{other}?inStock=false")).await;
    assert_eq!(body["pagination"]["total"], json!(0));

    let (status, _) = app.get("/variants/product/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn variant_references_must_exist() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/variants", json!({"variantId": "X", "sku": "X", "productId": 5}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("ValidationError"));

    let (product, _) = seed_variant(&app, 0).await;
    let (status, body) = app
        .post(
            "/variants",
            json!({"variantId": "SJ-32", "sku": "OTHER", "productId": product}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Variant with this variantId already exists"));
}
