use serde_json::json;

use crate::common::{TestApp, routes};

mod auth {
    use super::*;

    #[tokio::test]
    async fn missing_and_invalid_tokens_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::FILES, None).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");

        let res = app.get(routes::FILES, Some("not-a-jwt")).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn first_request_mirrors_the_owner_once() {
        let app = TestApp::spawn().await;
        let token = app.token_for("New.User@Example.com", Some("New User"));

        assert_eq!(app.get(routes::FILES, Some(&token)).await.status, 200);
        assert_eq!(app.get(routes::STATS, Some(&token)).await.status, 200);
        assert_eq!(app.user_count().await, 1);
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::HEALTH, None).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "ok");
    }
}

mod files {
    use super::*;

    #[tokio::test]
    async fn upload_list_download_delete() {
        let app = TestApp::spawn().await;
        let token = app.token_for("alice@example.com", None);

        let res = app
            .upload_http(
                vec![("Hello.txt", b"hi there".to_vec(), Some("text/plain"))],
                Some("greeting, demo"),
                &token,
            )
            .await;
        assert_eq!(res.status, 201, "upload failed: {:?}", res.body);
        assert_eq!(res.body["stored"], 1);
        let result = &res.body["results"][0];
        assert_eq!(result["is_new"], true);
        assert_eq!(result["ref_count"], 1);
        assert_eq!(result["file"]["tags"], json!(["greeting", "demo"]));
        let id = result["file"]["id"].as_str().unwrap().to_string();
        let digest = result["file"]["digest"].as_str().unwrap().to_string();

        let list = app.get(routes::FILES, Some(&token)).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body["pagination"]["total"], 1);
        assert_eq!(list.body["data"][0]["filename"], "Hello.txt");

        let download = app.get(&routes::file_download(&id), Some(&token)).await;
        assert_eq!(download.status, 200);
        assert_eq!(download.bytes, b"hi there");
        assert_eq!(download.header("content-type"), Some("text/plain"));
        assert_eq!(download.header("cache-control"), Some("no-store"));
        assert_eq!(download.header("etag"), Some(format!("\"{digest}\"").as_str()));
        assert!(
            download
                .header("content-disposition")
                .unwrap()
                .contains("Hello.txt")
        );

        let deleted = app.delete(&routes::file(&id), &token).await;
        assert_eq!(deleted.status, 204);
        assert_eq!(app.get(&routes::file(&id), Some(&token)).await.status, 404);
        assert_eq!(app.delete(&routes::file(&id), &token).await.status, 404);
        assert_eq!(app.blob_count().await, 0);
    }

    #[tokio::test]
    async fn second_upload_of_same_bytes_is_not_new() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice@example.com", None);
        let bob = app.token_for("bob@example.com", None);

        app.upload_http(vec![("a.txt", b"same".to_vec(), None)], None, &alice)
            .await;
        let res = app
            .upload_http(vec![("b.txt", b"same".to_vec(), None)], None, &bob)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["results"][0]["is_new"], false);
        assert_eq!(res.body["results"][0]["ref_count"], 2);
    }

    #[tokio::test]
    async fn partial_batch_reports_each_item() {
        let app = TestApp::spawn_with(server::config::VaultConfig {
            max_upload_bytes: 8,
            ..Default::default()
        })
        .await;
        let token = app.token_for("alice@example.com", None);

        let res = app
            .upload_http(
                vec![
                    ("small.txt", b"tiny".to_vec(), None),
                    ("large.txt", b"far too large".to_vec(), None),
                ],
                None,
                &token,
            )
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["stored"], 1);
        assert_eq!(res.body["failed"], 1);
        assert!(res.body["results"][0]["file"].is_object());
        assert_eq!(res.body["results"][1]["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn rejected_single_upload_uses_the_item_status() {
        let app = TestApp::spawn().await;
        let token = app.token_for("tight@example.com", None);
        app.create_owner("tight@example.com", 4).await;

        let res = app
            .upload_http(vec![("big.txt", b"12345".to_vec(), None)], None, &token)
            .await;
        assert_eq!(res.status, 507);
        assert_eq!(res.body["code"], "QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn upload_without_files_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.token_for("alice@example.com", None);

        let res = app.upload_http(vec![], Some("lonely"), &token).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn other_owners_files_are_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice@example.com", None);
        let eve = app.token_for("eve@example.com", None);

        let res = app
            .upload_http(vec![("a.txt", b"private".to_vec(), None)], None, &alice)
            .await;
        let id = res.body["results"][0]["file"]["id"].as_str().unwrap().to_string();

        assert_eq!(app.get(&routes::file(&id), Some(&eve)).await.status, 404);
        assert_eq!(
            app.get(&routes::file_download(&id), Some(&eve)).await.status,
            404
        );
        assert_eq!(app.delete(&routes::file(&id), &eve).await.status, 404);
    }

    #[tokio::test]
    async fn invalid_ids_and_filters_are_validation_errors() {
        let app = TestApp::spawn().await;
        let token = app.token_for("alice@example.com", None);

        let res = app.get(&routes::file("not-a-uuid"), Some(&token)).await;
        assert_eq!(res.status, 400);

        let res = app
            .get(&format!("{}?min_size=10&max_size=1", routes::FILES), Some(&token))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn huge_page_number_lists_nothing() {
        let app = TestApp::spawn().await;
        let token = app.token_for("alice@example.com", None);
        app.upload_http(vec![("a.txt", b"text body".to_vec(), None)], None, &token)
            .await;

        let res = app
            .get(&format!("{}?page={}", routes::FILES, u64::MAX), Some(&token))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"], json!([]));
        assert_eq!(res.body["pagination"]["total"], 1);

        let res = app
            .get(&format!("{}?page={}", routes::PUBLIC_FILES, u64::MAX), None)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"], json!([]));
    }

    #[tokio::test]
    async fn list_filters_by_media_family() {
        let app = TestApp::spawn().await;
        let token = app.token_for("alice@example.com", None);

        app.upload_http(
            vec![
                ("a.txt", b"text body".to_vec(), None),
                ("b.pdf", b"%PDF-1.4 body".to_vec(), None),
            ],
            None,
            &token,
        )
        .await;

        let res = app
            .get(&format!("{}?media_types=text/", routes::FILES), Some(&token))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["filename"], "a.txt");
    }

    #[tokio::test]
    async fn stats_show_dedup_savings() {
        let app = TestApp::spawn().await;
        let token = app.token_for("alice@example.com", None);

        app.upload_http(
            vec![
                ("a.txt", b"abcd".to_vec(), None),
                ("b.txt", b"abcd".to_vec(), None),
            ],
            None,
            &token,
        )
        .await;

        let res = app.get(routes::STATS, Some(&token)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["original_bytes"], 8);
        assert_eq!(res.body["dedup_bytes"], 4);
        assert_eq!(res.body["savings_bytes"], 4);
    }
}

mod sharing {
    use super::*;

    async fn uploaded_id(app: &TestApp, token: &str, name: &str, data: &[u8]) -> String {
        let res = app
            .upload_http(vec![(name, data.to_vec(), None)], None, token)
            .await;
        assert_eq!(res.status, 201, "upload failed: {:?}", res.body);
        res.body["results"][0]["file"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn public_share_round_trip() {
        let app = TestApp::spawn().await;
        let token = app.token_for("alice@example.com", Some("Alice"));
        let id = uploaded_id(&app, &token, "pic.txt", b"look at this").await;

        let res = app
            .put_json(&routes::file_share(&id), &json!({"visibility": "PUBLIC"}), &token)
            .await;
        assert_eq!(res.status, 200);
        let share_token = res.body["token"].as_str().unwrap().to_string();
        assert_eq!(share_token.len(), 32);

        let gallery = app.get(routes::PUBLIC_FILES, None).await;
        assert_eq!(gallery.status, 200);
        assert_eq!(gallery.body["pagination"]["total"], 1);
        assert_eq!(gallery.body["data"][0]["uploader"]["name"], "Alice");
        assert_eq!(gallery.body["data"][0]["token"], share_token.as_str());

        let by_token = app.get(&routes::shared(&share_token), None).await;
        assert_eq!(by_token.status, 200);
        assert_eq!(by_token.bytes, b"look at this");

        let by_id = app.get(&routes::public_download(&id), None).await;
        assert_eq!(by_id.status, 200);

        let info = app.get(&routes::file_share(&id), Some(&token)).await;
        assert_eq!(info.body["visibility"], "PUBLIC");
        assert_eq!(info.body["expired"], false);

        assert_eq!(app.delete(&routes::file_share(&id), &token).await.status, 204);
        assert_eq!(app.get(&routes::shared(&share_token), None).await.status, 404);
        assert_eq!(app.get(&routes::file_share(&id), Some(&token)).await.status, 404);
    }

    #[tokio::test]
    async fn past_expiry_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token_for("alice@example.com", None);
        let id = uploaded_id(&app, &token, "a.txt", b"expiring").await;

        let res = app
            .put_json(
                &routes::file_share(&id),
                &json!({"visibility": "PUBLIC", "expires_at": "2000-01-01T00:00:00Z"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn private_share_is_unlisted() {
        let app = TestApp::spawn().await;
        let token = app.token_for("alice@example.com", None);
        let id = uploaded_id(&app, &token, "a.txt", b"hush").await;

        let res = app
            .put_json(&routes::file_share(&id), &json!({"visibility": "PRIVATE"}), &token)
            .await;
        let share_token = res.body["token"].as_str().unwrap().to_string();

        let gallery = app.get(routes::PUBLIC_FILES, None).await;
        assert_eq!(gallery.body["pagination"]["total"], 0);
        assert_eq!(app.get(&routes::shared(&share_token), None).await.status, 200);
        assert_eq!(app.get(&routes::public_download(&id), None).await.status, 404);
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::shared("doesnotexist"), None).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod folders {
    use super::*;

    #[tokio::test]
    async fn create_nest_rename_share_delete() {
        let app = TestApp::spawn().await;
        let token = app.token_for("alice@example.com", None);

        let root = app
            .post_json(routes::FOLDERS, &json!({"name": "Projects"}), &token)
            .await;
        assert_eq!(root.status, 201);
        let root_id = root.body["id"].as_str().unwrap().to_string();

        let child = app
            .post_json(
                routes::FOLDERS,
                &json!({"name": "Vault", "parent_id": root_id}),
                &token,
            )
            .await;
        assert_eq!(child.status, 201);
        let child_id = child.body["id"].as_str().unwrap().to_string();

        let top = app.get(routes::FOLDERS, Some(&token)).await;
        assert_eq!(top.body.as_array().unwrap().len(), 1);

        let children = app
            .get(&format!("{}?parent_id={root_id}", routes::FOLDERS), Some(&token))
            .await;
        assert_eq!(children.body[0]["name"], "Vault");

        let renamed = app
            .patch_json(&routes::folder(&child_id), &json!({"name": "Archive"}), &token)
            .await;
        assert_eq!(renamed.status, 200);
        assert_eq!(renamed.body["name"], "Archive");

        let tree = app.get(&routes::folder_tree(&root_id), Some(&token)).await;
        assert_eq!(tree.body.as_array().unwrap().len(), 2);

        let shared = app
            .put_json(
                &routes::folder_share(&child_id),
                &json!({"visibility": "PRIVATE"}),
                &token,
            )
            .await;
        assert_eq!(shared.status, 200);
        assert_eq!(shared.body["target_type"], "FOLDER");

        assert_eq!(app.delete(&routes::folder(&root_id), &token).await.status, 204);
        assert_eq!(
            app.get(&routes::folder_tree(&root_id), Some(&token))
                .await
                .status,
            404
        );
        assert_eq!(
            app.get(&routes::folder_share(&child_id), Some(&token))
                .await
                .status,
            404
        );
    }

    #[tokio::test]
    async fn bad_names_and_foreign_parents_are_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice@example.com", None);
        let eve = app.token_for("eve@example.com", None);

        let res = app
            .post_json(routes::FOLDERS, &json!({"name": "a/b"}), &alice)
            .await;
        assert_eq!(res.status, 400);

        let root = app
            .post_json(routes::FOLDERS, &json!({"name": "Mine"}), &alice)
            .await;
        let root_id = root.body["id"].as_str().unwrap();

        let res = app
            .post_json(
                routes::FOLDERS,
                &json!({"name": "Sneaky", "parent_id": root_id}),
                &eve,
            )
            .await;
        assert_eq!(res.status, 404);
    }
}
