use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::json;

use server::entity::ingredient;
use server::error::AppError;

use crate::common::{TestApp, routes};

async fn stored_ingredient_count(app: &TestApp, recipe_id: i32) -> u64 {
    ingredient::Entity::find()
        .filter(ingredient::Column::RecipeId.eq(recipe_id))
        .count(&app.db)
        .await
        .unwrap()
}

mod create {
    use super::*;

    #[tokio::test]
    async fn recipe_is_stored_with_all_ingredients_in_order() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;

        let id = app
            .create_recipe(&token, "Nudelsalat", &["Nudeln", "Mayonnaise", "Gurken"])
            .await;

        assert_eq!(stored_ingredient_count(&app, id).await, 3);
        let res = app.get_without_token(&routes::recipe(id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.ingredient_names(), vec!["Nudeln", "Mayonnaise", "Gurken"]);
        assert_eq!(res.body["author"]["first_name"], "Test");
        assert_eq!(res.body["category"]["name"], "Hauptgericht");
        assert_eq!(res.body["is_owner"], false);
    }

    #[tokio::test]
    async fn textual_quantity_is_coerced() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let category_id = app.category_id("Backen").await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &json!({
                    "name": "Kuchen",
                    "category_id": category_id,
                    "ingredients": [
                        {"name": "Mehl", "quantity": "2,5", "unit": "kg"},
                        {"name": "Prise Salz", "quantity": "etwas", "unit": ""},
                    ],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["servings"], 1);
        assert_eq!(res.body["ingredients"][0]["quantity"], 2.5);
        assert_eq!(res.body["ingredients"][1]["quantity"], 0.0);
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &json!({"name": "Suppe", "category_id": 9999}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn ingredient_without_name_is_rejected_and_nothing_is_stored() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let category_id = app.category_id("Suppe").await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &json!({
                    "name": "Suppe",
                    "category_id": category_id,
                    "ingredients": [{"name": " ", "quantity": 1, "unit": "l"}],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        let list = app.get_without_token(routes::RECIPES).await;
        assert_eq!(list.body["total"], 0);
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_create() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::RECIPES, &json!({"name": "Suppe", "category_id": 1}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn new_recipe_form_offers_one_blank_ingredient() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;

        let res = app.get_with_token(routes::NEW_RECIPE_FORM, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.body["ingredients"],
            json!([{"name": "", "quantity": 0.0, "unit": "", "additional_info": null}])
        );
        assert!(!res.body["categories"].as_array().unwrap().is_empty());
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn owner_sees_is_owner_flag() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let id = app.create_recipe(&token, "Gulasch", &["Rind"]).await;

        let res = app.get_with_token(&routes::recipe(id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_owner"], true);
    }

    #[tokio::test]
    async fn unknown_recipe_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::recipe(4242)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn edit_form_is_for_the_owner_only() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("anna@example.de").await;
        let other = app.create_authenticated_user("bernd@example.de").await;
        let id = app.create_recipe(&owner, "Gulasch", &["Rind", "Paprika"]).await;

        let res = app.get_with_token(&routes::recipe_edit_form(id), &owner).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["recipe"]["ingredients"].as_array().unwrap().len(), 2);
        assert!(res.body["categories"].is_array());

        let res = app.get_with_token(&routes::recipe_edit_form(id), &other).await;
        assert_eq!(res.status, 403);
    }
}

mod filter {
    use super::*;

    async fn pasta_and_salad(app: &TestApp) {
        let token = app.create_authenticated_user("anna@example.de").await;
        let main = app.category_id("Hauptgericht").await;
        let salad = app.category_id("Salat").await;
        app.create_recipe_in(&token, "Pasta", main, &["Nudeln", "Tomaten"])
            .await;
        app.create_recipe_in(&token, "Salad", salad, &["Gurke", "Tomaten"])
            .await;
    }

    fn names(res: &crate::common::TestResponse) -> Vec<String> {
        res.body["recipes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn name_filter_is_a_case_insensitive_substring_match() {
        let app = TestApp::spawn().await;
        pasta_and_salad(&app).await;

        let res = app.get_with_query(routes::RECIPES, &[("name", "PA")]).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(names(&res), vec!["Pasta"]);
        assert_eq!(res.body["total"], 1);
    }

    #[tokio::test]
    async fn empty_filters_match_everything_newest_first() {
        let app = TestApp::spawn().await;
        pasta_and_salad(&app).await;

        let res = app
            .get_with_query(
                routes::RECIPES,
                &[("name", ""), ("category_id", ""), ("ingredient", "")],
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(names(&res), vec!["Salad", "Pasta"]);
        assert!(!res.body["categories"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_and_ingredient_filters_combine() {
        let app = TestApp::spawn().await;
        pasta_and_salad(&app).await;
        let salad = app.category_id("Salat").await.to_string();

        let res = app
            .get_with_query(routes::RECIPES, &[("ingredient", "tomat")])
            .await;
        assert_eq!(names(&res), vec!["Salad", "Pasta"]);

        let res = app
            .get_with_query(
                routes::RECIPES,
                &[("ingredient", "tomat"), ("category_id", salad.as_str())],
            )
            .await;
        assert_eq!(names(&res), vec!["Salad"]);

        let res = app
            .get_with_query(routes::RECIPES, &[("ingredient", "nudel")])
            .await;
        assert_eq!(names(&res), vec!["Pasta"]);
    }

    #[tokio::test]
    async fn non_numeric_category_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .get_with_query(routes::RECIPES, &[("category_id", "salat")])
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn submitted_ingredient_list_replaces_the_stored_one() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let id = app.create_recipe(&token, "Gulasch", &["A", "B", "C"]).await;

        let res = app
            .put_with_token(
                &routes::recipe(id),
                &json!({
                    "name": "Gulasch deluxe",
                    "ingredients": [
                        {"name": "A", "quantity": 1, "unit": "Stk"},
                        {"name": "C", "quantity": 1, "unit": "Stk"},
                    ],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Gulasch deluxe");
        assert_eq!(res.ingredient_names(), vec!["A", "C"]);
        assert_eq!(stored_ingredient_count(&app, id).await, 2);
    }

    #[tokio::test]
    async fn omitted_ingredients_are_kept() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let id = app.create_recipe(&token, "Gulasch", &["A", "B"]).await;

        let res = app
            .put_with_token(
                &routes::recipe(id),
                &json!({"servings": 6, "description": null}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["servings"], 6);
        assert!(res.body["description"].is_null());
        assert_eq!(res.ingredient_names(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn empty_ingredient_list_removes_all() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let id = app.create_recipe(&token, "Gulasch", &["A", "B"]).await;

        let res = app
            .put_with_token(&routes::recipe(id), &json!({"ingredients": []}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(stored_ingredient_count(&app, id).await, 0);
    }

    #[tokio::test]
    async fn non_owner_cannot_update() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("anna@example.de").await;
        let other = app.create_authenticated_user("bernd@example.de").await;
        let id = app.create_recipe(&owner, "Gulasch", &["A"]).await;

        let res = app
            .put_with_token(&routes::recipe(id), &json!({"name": "Meins"}), &other)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        let res = app.get_without_token(&routes::recipe(id)).await;
        assert_eq!(res.body["name"], "Gulasch");
    }
}

mod ingredient_edits {
    use super::*;

    #[tokio::test]
    async fn removing_the_middle_entry_shifts_later_ones() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let id = app.create_recipe(&token, "Gulasch", &["A", "B", "C"]).await;

        let res = app
            .post_with_token(
                &routes::recipe_ingredients(id),
                &json!({"edits": [{"op": "remove", "index": 1}]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["recipe_id"], id);
        assert_eq!(res.ingredient_names(), vec!["A", "C"]);
        assert_eq!(stored_ingredient_count(&app, id).await, 2);
    }

    #[tokio::test]
    async fn appended_entry_can_be_filled_in_the_same_request() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let id = app.create_recipe(&token, "Gulasch", &["A"]).await;

        let res = app
            .post_with_token(
                &routes::recipe_ingredients(id),
                &json!({"edits": [
                    {"op": "append"},
                    {"op": "set", "index": 1, "field": "name", "value": "Zwiebel"},
                    {"op": "set", "index": 1, "field": "quantity", "value": "3"},
                    {"op": "set", "index": 1, "field": "unit", "value": "Stk"},
                ]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.ingredient_names(), vec!["A", "Zwiebel"]);
        assert_eq!(res.body["ingredients"][1]["quantity"], 3.0);
    }

    #[tokio::test]
    async fn out_of_range_edit_rejects_the_whole_batch() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let id = app.create_recipe(&token, "Gulasch", &["A", "B"]).await;

        let res = app
            .post_with_token(
                &routes::recipe_ingredients(id),
                &json!({"edits": [
                    {"op": "remove", "index": 0},
                    {"op": "remove", "index": 5},
                ]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(stored_ingredient_count(&app, id).await, 2);
    }

    #[tokio::test]
    async fn blank_appended_entry_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let id = app.create_recipe(&token, "Gulasch", &["A"]).await;

        let res = app
            .post_with_token(
                &routes::recipe_ingredients(id),
                &json!({"edits": [{"op": "append"}]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(stored_ingredient_count(&app, id).await, 1);
    }

    #[tokio::test]
    async fn non_owner_cannot_edit_ingredients() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("anna@example.de").await;
        let other = app.create_authenticated_user("bernd@example.de").await;
        let id = app.create_recipe(&owner, "Gulasch", &["A"]).await;

        let res = app
            .post_with_token(
                &routes::recipe_ingredients(id),
                &json!({"edits": [{"op": "remove", "index": 0}]}),
                &other,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(stored_ingredient_count(&app, id).await, 1);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn owner_deletes_recipe_with_its_ingredients() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;
        let id = app.create_recipe(&token, "Gulasch", &["A", "B"]).await;

        let res = app.delete_with_token(&routes::recipe(id), &token).await;

        assert_eq!(res.status, 204, "{}", res.text);
        assert_eq!(stored_ingredient_count(&app, id).await, 0);
        let res = app.get_without_token(&routes::recipe(id)).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("anna@example.de").await;
        let other = app.create_authenticated_user("bernd@example.de").await;
        let id = app.create_recipe(&owner, "Gulasch", &["A"]).await;

        let res = app.delete_with_token(&routes::recipe(id), &other).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        assert_eq!(stored_ingredient_count(&app, id).await, 1);
    }

    #[tokio::test]
    async fn deleting_a_missing_recipe_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("anna@example.de").await;

        let res = app.delete_with_token(&routes::recipe(999), &token).await;

        assert_eq!(res.status, 404);
    }
}

mod integrity {
    use super::*;

    #[tokio::test]
    async fn dangling_recipe_reference_is_a_conflict() {
        let app = TestApp::spawn().await;

        let err = ingredient::ActiveModel {
            recipe_id: Set(424_242),
            position: Set(0),
            name: Set("Salz".into()),
            quantity: Set(1.0),
            unit: Set("Prise".into()),
            additional_info: Set(None),
            ..Default::default()
        }
        .insert(&app.db)
        .await
        .unwrap_err();

        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
