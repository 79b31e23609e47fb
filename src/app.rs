/// Application shell for TrustShop: session and toast contexts, navigation and routes.
use crate::components::admin_reviews::AdminReviews;
use crate::components::my_reviews::MyReviews;
use crate::components::notification::{NotificationArea, Notifications};
use crate::components::protected_route::RequireAuth;
use crate::components::shop_page::ShopPage;
use crate::components::sign_in::SignIn;
use crate::session::{BrowserTokenStore, Session};
use leptos::*;
use leptos_meta::*;
use leptos_router::*;
use std::rc::Rc;

#[component]
fn Nav() -> impl IntoView {
    let session = expect_context::<Session>();
    let user = session.user();
    let sign_out = {
        let session = session.clone();
        move |_| session.teardown()
    };

    view! {
        <nav class="top-nav">
            <A href="/">"TrustShop"</A>
            {move || match user.get() {
                Some(u) => {
                    let sign_out = sign_out.clone();
                    view! {
                        <A href="/account/reviews">"My reviews"</A>
                        {u.is_admin().then(|| view! { <A href="/admin/reviews">"Moderation"</A> })}
                        <span class="user">{u.full_name}</span>
                        <button on:click=sign_out>"Sign out"</button>
                    }
                    .into_view()
                }
                None => view! { <A href="/signin">"Sign in"</A> }.into_view(),
            }}
        </nav>
    }
}

#[component]
fn Home() -> impl IntoView {
    view! {
        <section class="home">
            <h1>"Verified shop reviews"</h1>
            <p>
                "Every rating of three stars or fewer is backed by an order number and photos, "
                "and checked by a moderator before it is published."
            </p>
        </section>
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    let session = Session::new(Rc::new(BrowserTokenStore));
    provide_context(session.clone());
    provide_context(Notifications::new());

    // restore the stored token once in the browser
    create_effect(move |_| {
        session.init();
        let session = session.clone();
        spawn_local(async move { session.refresh_user().await });
    });

    view! {
        <Stylesheet id="leptos" href="/pkg/trustshop.css"/>
        <Title text="TrustShop"/>
        <Router>
            <Nav/>
            <NotificationArea/>
            <main>
                <Routes>
                    <Route path="/" view=Home/>
                    <Route path="/shops/:id" view=ShopPage/>
                    <Route path="/signin" view=SignIn/>
                    <Route
                        path="/account/reviews"
                        view=|| view! { <RequireAuth><MyReviews/></RequireAuth> }
                    />
                    <Route
                        path="/admin/reviews"
                        view=|| view! { <RequireAuth admin_only=true><AdminReviews/></RequireAuth> }
                    />
                    <Route path="/*any" view=|| view! { <p class="hint">"Page not found."</p> }/>
                </Routes>
            </main>
        </Router>
    }
}
