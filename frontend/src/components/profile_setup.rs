//! 首次登录的档案补全页
//!
//! multipart 提交：文本字段 + 可选头像。头像字节在浏览器侧
//! 经 `File::array_buffer` 读出，传输层再组装成 FormData。

use crate::api::{ApiError, use_api};
use crate::components::notify::use_notify;
use crate::session::use_session;
use crate::web::route::{AdminRoute, AppRoute};
use crate::web::router::use_navigate;
use leptos::prelude::*;
use leptos::task::spawn_local;
use topnotes_shared::protocol::{CreateProfileRequest, ProfilePhoto};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlInputElement;

#[component]
pub fn ProfileSetupPage() -> impl IntoView {
    let client = use_api();
    let session = use_session();
    let notify = use_notify();
    let navigate = use_navigate();

    let (full_name, set_full_name) = signal(String::new());
    let (bio, set_bio) = signal(String::new());
    let (department, set_department) = signal(String::new());
    let (designation, set_designation) = signal(String::new());
    let photo = RwSignal::new_local(Option::<ProfilePhoto>::None);

    let (submitting, set_submitting) = signal(false);
    let (error, set_error) = signal(Option::<ApiError>::None);

    let on_file = move |ev: leptos::web_sys::Event| {
        let input: HtmlInputElement = event_target(&ev);
        let Some(file) = input.files().and_then(|list| list.get(0)) else {
            photo.set(None);
            return;
        };
        spawn_local(async move {
            match JsFuture::from(file.array_buffer()).await {
                Ok(buffer) => {
                    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
                    photo.set(Some(ProfilePhoto {
                        file_name: file.name(),
                        mime: file.type_(),
                        bytes,
                    }));
                }
                Err(e) => {
                    web_sys::console::warn_1(&format!("[Profile] file read failed: {e:?}").into());
                }
            }
        });
    };

    let on_submit = {
        let navigate = navigate.clone();
        move |ev: leptos::web_sys::SubmitEvent| {
            ev.prevent_default();
            let name = full_name.get();
            if name.trim().is_empty() {
                notify.error("Full name is required");
                return;
            }

            set_submitting.set(true);
            set_error.set(None);

            let request = CreateProfileRequest {
                full_name: name.trim().to_string(),
                bio: bio.get(),
                department: department.get(),
                designation: designation.get(),
                profile_photo: photo.get_untracked(),
            };

            let client = client.clone();
            let session = session.clone();
            let navigate = navigate.clone();
            spawn_local(async move {
                match client.mutate(&request).await {
                    Ok(_) => {
                        // 服务端已标记档案完成，本地 userDetails 同步跟进
                        let mut user = session.current().user().cloned().unwrap_or_default();
                        user.profile_completed = true;
                        user.full_name = Some(request.full_name.clone());
                        if let Some(token) = session.token() {
                            session.establish(&token, &user);
                        }
                        notify.success("Profile saved");
                        navigate(AppRoute::Admin(AdminRoute::Dashboard));
                    }
                    Err(e) => set_error.set(Some(e)),
                }
                set_submitting.set(false);
            });
        }
    };

    view! {
        <div class="flex items-center justify-center min-h-screen bg-base-200 p-4">
            <div class="card w-full max-w-lg shadow-2xl bg-base-100">
                <form class="card-body" on:submit=on_submit>
                    <h2 class="card-title">"Complete your profile"</h2>
                    <p class="text-sm text-base-content/70">
                        "This is shown alongside your moderation decisions."
                    </p>

                    <Show when=move || error.get().is_some()>
                        <div role="alert" class="alert alert-error text-sm py-2">
                            <span>{move || error.get().unwrap().user_message()}</span>
                        </div>
                    </Show>

                    <div class="form-control">
                        <label class="label"><span class="label-text">"Full name"</span></label>
                        <input
                            type="text"
                            class="input input-bordered"
                            on:input=move |ev| set_full_name.set(event_target_value(&ev))
                            prop:value=full_name
                            required
                        />
                    </div>
                    <div class="form-control">
                        <label class="label"><span class="label-text">"Bio"</span></label>
                        <textarea
                            class="textarea textarea-bordered"
                            rows="3"
                            on:input=move |ev| set_bio.set(event_target_value(&ev))
                            prop:value=bio
                        ></textarea>
                    </div>
                    <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                        <div class="form-control">
                            <label class="label"><span class="label-text">"Department"</span></label>
                            <input
                                type="text"
                                class="input input-bordered"
                                on:input=move |ev| set_department.set(event_target_value(&ev))
                                prop:value=department
                            />
                        </div>
                        <div class="form-control">
                            <label class="label"><span class="label-text">"Designation"</span></label>
                            <input
                                type="text"
                                class="input input-bordered"
                                on:input=move |ev| set_designation.set(event_target_value(&ev))
                                prop:value=designation
                            />
                        </div>
                    </div>
                    <div class="form-control">
                        <label class="label"><span class="label-text">"Profile photo (optional)"</span></label>
                        <input
                            type="file"
                            accept="image/*"
                            class="file-input file-input-bordered"
                            on:change=on_file
                        />
                    </div>

                    <div class="form-control mt-4">
                        <button class="btn btn-primary" disabled=move || submitting.get()>
                            {move || if submitting.get() {
                                view! { <span class="loading loading-spinner"></span> "Saving..." }.into_any()
                            } else {
                                "Save and continue".into_any()
                            }}
                        </button>
                    </div>
                </form>
            </div>
        </div>
    }
}
