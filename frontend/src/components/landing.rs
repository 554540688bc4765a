//! 公开落地页

use crate::components::icons::ShieldCheck;
use crate::web::route::AppRoute;
use crate::web::router::use_navigate;
use leptos::prelude::*;

#[component]
pub fn LandingPage() -> impl IntoView {
    let navigate = use_navigate();

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content text-center">
                <div class="max-w-md">
                    <div class="flex justify-center mb-4">
                        <div class="p-4 bg-primary/10 rounded-2xl text-primary">
                            <ShieldCheck attr:class="h-10 w-10" />
                        </div>
                    </div>
                    <h1 class="text-5xl font-bold">"TopNotes"</h1>
                    <p class="py-6 text-base-content/70">
                        "Moderation console for toppers, study notes and creator payouts."
                    </p>
                    <button
                        class="btn btn-primary"
                        on:click=move |_| navigate(AppRoute::Login)
                    >
                        "Admin sign in"
                    </button>
                </div>
            </div>
        </div>
    }
}
