mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn template_fields_and_config() -> Result<()> {
    let server = common::spawn_server().await?;
    let id = server
        .create("/api/templates", json!({ "name": "Intake", "description": "first contact" }))
        .await?;
    let fields_path = format!("/api/templates/{}/fields", id);

    let title_id = server
        .create(
            &fields_path,
            json!({ "fieldCode": "title", "fieldName": "Title", "fieldType": "input", "required": true }),
        )
        .await?;
    server
        .create(
            &fields_path,
            json!({ "fieldCode": "qty", "fieldName": "Qty", "fieldType": "number", "min": 1, "max": 5 }),
        )
        .await?;

    let (status, body) = server
        .post(&fields_path, json!({ "fieldCode": "title", "fieldName": "Again", "fieldType": "text" }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("title already exists"));

    let (status, body) = server
        .post(&fields_path, json!({ "fieldCode": "c", "fieldName": "C", "fieldType": "color" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("fieldType color not supported"));

    let (status, body) = server.get(&fields_path).await?;
    assert_eq!(status, StatusCode::OK);
    let fields = body["data"].as_array().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0]["fieldCode"], json!("title"));
    assert_eq!(fields[0]["fieldType"], json!("text"));
    assert_eq!(fields[0]["required"], json!(true));

    let (status, body) = server
        .put(
            &format!("{}/{}", fields_path, title_id),
            json!({ "fieldCode": "title", "fieldName": "Headline", "fieldType": "text", "regex": "^[A-Z]" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fieldName"], json!("Headline"));
    assert_eq!(body["data"]["regex"], json!("^[A-Z]"));

    let config_path = format!("/api/templates/{}/config", id);
    let (_, body) = server.get(&config_path).await?;
    assert_eq!(body["data"], json!({ "version": 1, "layout": [] }));

    let (status, body) = server
        .put(&config_path, json!({ "version": 2, "layout": [] }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("template_config_json.version must be 1"));

    let (status, body) = server
        .put(
            &config_path,
            json!({ "version": 1, "layout": [{ "fieldCode": "qty", "span": 30 }] }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("layout[0].span must be 1-24"));

    let (status, body) = server
        .put(
            &config_path,
            json!({ "version": 1, "layout": [{ "fieldCode": "qty", "span": 12, "label": "Quantity" }] }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["layout"][0],
        json!({
            "fieldCode": "qty",
            "span": 12,
            "label": "Quantity",
            "placeholder": null,
            "visible": true,
            "readonly": false
        })
    );
    let (_, stored) = server.get(&config_path).await?;
    assert_eq!(stored["data"], body["data"]);
    Ok(())
}

#[tokio::test]
async fn template_update_delete_and_missing() -> Result<()> {
    let server = common::spawn_server().await?;
    let id = server.create("/api/templates", json!({ "name": "Intake" })).await?;
    server.create("/api/templates", json!({ "name": "Other" })).await?;

    let (status, body) = server
        .put(&format!("/api/templates/{}", id), json!({ "name": "Other" }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("Other already exists"));

    let (status, _) = server
        .put(&format!("/api/templates/{}", id), json!({ "name": "Renamed" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.get("/api/templates/missing/fields").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.delete(&format!("/api/templates/{}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = server.get("/api/templates").await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn template_with_cases_cannot_be_deleted() -> Result<()> {
    let server = common::spawn_server().await?;
    let id = server.create("/api/templates", json!({ "name": "Intake" })).await?;
    server
        .create("/api/cases", json!({ "templateId": id, "title": "First" }))
        .await?;

    let (status, body) = server.delete(&format!("/api/templates/{}", id)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("template has cases"));
    Ok(())
}
