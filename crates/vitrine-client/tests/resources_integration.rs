//! Resource API integration tests.

mod common;

use anyhow::Result;
use serde_json::json;
use vitrine_client::{Characteristic, CharacteristicsRequest, FormData, Page};
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use common::TestApi;

#[tokio::test]
async fn test_brand_create_sends_multipart_form() -> Result<()> {
    let api = TestApi::signed_in("abc", "r1").await?;
    Mock::given(method("POST"))
        .and(path("/brands/"))
        .and(header("Authorization", "Bearer abc"))
        .and(body_string_contains("Acme"))
        .and(body_string_contains("logo.png"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5, "name": "Acme"})))
        .expect(1)
        .mount(&api.server)
        .await;

    let form = FormData::new()
        .text("name", "Acme")
        .file("logo", "logo.png", Some("image/png"), b"PNGDATA".to_vec());
    let created = api.client.brands().create(form).await?;
    assert_eq!(created["id"], 5);

    let requests = api.requests_to("/brands/").await;
    let content_type = requests[0].headers["content-type"].to_str()?;
    assert!(content_type.starts_with("multipart/form-data"));

    Ok(())
}

#[tokio::test]
async fn test_update_methods_per_resource() -> Result<()> {
    let api = TestApi::signed_in("abc", "r1").await?;
    for (verb, resource) in [
        ("PUT", "brands"),
        ("PATCH", "categories"),
        ("PATCH", "subcategories"),
        ("PATCH", "products"),
    ] {
        Mock::given(method(verb))
            .and(path(format!("/{}/7", resource)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
            .expect(1)
            .mount(&api.server)
            .await;
    }

    let form = || FormData::new().text("name", "Renamed");
    api.client.brands().update(7, form()).await?;
    api.client.categories().update(7, form()).await?;
    api.client.subcategories().update(7, form()).await?;
    api.client.products().update(7, form()).await?;

    Ok(())
}

#[tokio::test]
async fn test_tags_use_json_bodies() -> Result<()> {
    let api = TestApi::signed_in("abc", "r1").await?;
    Mock::given(method("POST"))
        .and(path("/tags/"))
        .and(body_json(json!({"name": "color", "value": "red"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/tags/1"))
        .and(body_json(json!({"name": "color", "value": "blue"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&api.server)
        .await;

    api.client.tags().create("color", "red").await?;
    api.client.tags().update(1, "color", "blue").await?;

    Ok(())
}

#[tokio::test]
async fn test_characteristics_replace() -> Result<()> {
    let api = TestApi::signed_in("abc", "r1").await?;
    Mock::given(method("PUT"))
        .and(path("/characteristics/3"))
        .and(body_json(json!({
            "name": "Size",
            "characteristics": [{"name": "eu", "label": "EU", "value": "42"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
        .expect(1)
        .mount(&api.server)
        .await;

    let request = CharacteristicsRequest {
        name: "Size".to_string(),
        characteristics: vec![Characteristic {
            name: "eu".to_string(),
            label: "EU".to_string(),
            value: "42".to_string(),
        }],
    };
    api.client.characteristics().update(3, &request).await?;

    Ok(())
}

#[tokio::test]
async fn test_lists_send_pagination_and_bypass_cache() -> Result<()> {
    let api = TestApi::start_with(|config| config.cache.ttl_secs = 60).await?;
    api.sign_in("abc", "r1").await?;
    Mock::given(method("GET"))
        .and(path("/products/"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&api.server)
        .await;

    api.client.products().list(Page::new(2, 25)).await?;
    api.client.products().list(Page::new(2, 25)).await?;
    assert!(api.client.cache().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_categories_list_typed() -> Result<()> {
    let api = TestApi::signed_in("abc", "r1").await?;
    Mock::given(method("GET"))
        .and(path("/categories/"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": 1, "text": "Shoes", "slug": "shoes", "icon": "shoe.svg", "filters": []},
                {"id": 2, "text": "Bags", "slug": "bags", "icon": "bag.svg"}
            ]
        })))
        .mount(&api.server)
        .await;

    let categories = api.client.categories().list_typed(Page::default()).await?;
    let slugs: Vec<_> = categories.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(slugs, vec!["shoes", "bags"]);

    Ok(())
}

#[tokio::test]
async fn test_delete_and_not_found() -> Result<()> {
    let api = TestApi::signed_in("abc", "r1").await?;
    Mock::given(method("DELETE"))
        .and(path("/subcategories/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/subcategories/10"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such subcategory"})))
        .mount(&api.server)
        .await;

    api.client.subcategories().delete(9).await?;
    let err = api.client.subcategories().delete(10).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Not found: no such subcategory");

    Ok(())
}
