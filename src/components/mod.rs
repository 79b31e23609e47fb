pub mod admin_reviews;
pub mod delete_review_dialog;
pub mod edit_review_dialog;
pub mod image_upload;
pub mod my_reviews;
pub mod notification;
pub mod proof_upload_dialog;
pub mod protected_route;
pub mod review_form;
pub mod reviews_list;
pub mod shop_page;
pub mod sign_in;
pub mod status_badge;
