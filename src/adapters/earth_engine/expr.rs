//! Earth Engine REST 運算式圖。
//!
//! 查詢以宣告式的函式呼叫樹表示，序列化成 `{"expression": {"values": ..., "result": ...}}`
//! 交給遠端平台執行。本地不做任何影像運算。

use crate::domain::model::{AreaOfInterest, SpectralIndex, ViewMode};
use chrono::NaiveDate;
use serde_json::{json, Map, Value};

pub const SENTINEL2_SR: &str = "COPERNICUS/S2_SR_HARMONIZED";
const CLOUD_BIT: u32 = 1 << 10;
const CIRRUS_BIT: u32 = 1 << 11;
const REFLECTANCE_SCALE: f64 = 10000.0;
const MAPPING_VAR: &str = "_MAPPING_VAR_0_0";

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Value),
    Call {
        function: &'static str,
        args: Vec<(&'static str, Expr)>,
    },
    Argument(&'static str),
    Function {
        params: Vec<&'static str>,
        body: Box<Expr>,
    },
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn null() -> Self {
        Expr::Constant(Value::Null)
    }

    pub fn call<I>(function: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Expr)>,
    {
        Expr::Call {
            function,
            args: args.into_iter().collect(),
        }
    }

    pub fn function(params: Vec<&'static str>, body: Expr) -> Self {
        Expr::Function {
            params,
            body: Box::new(body),
        }
    }

    /// 編碼為 REST API 的 `Expression` 物件
    pub fn to_request(&self) -> Value {
        let mut values = Vec::new();
        let root = self.encode(&mut values);
        values.push(root);
        let result = (values.len() - 1).to_string();

        let table: Map<String, Value> = values
            .into_iter()
            .enumerate()
            .map(|(id, node)| (id.to_string(), node))
            .collect();

        json!({ "values": table, "result": result })
    }

    fn encode(&self, values: &mut Vec<Value>) -> Value {
        match self {
            Expr::Constant(value) => json!({ "constantValue": value }),
            Expr::Call { function, args } => {
                let arguments: Map<String, Value> = args
                    .iter()
                    .map(|(name, arg)| (name.to_string(), arg.encode(values)))
                    .collect();
                json!({
                    "functionInvocationValue": {
                        "functionName": function,
                        "arguments": arguments,
                    }
                })
            }
            Expr::Argument(name) => json!({ "argumentReference": name }),
            Expr::Function { params, body } => {
                // 函式本體放進 values 表，以 id 參照
                let encoded = body.encode(values);
                values.push(encoded);
                json!({
                    "functionDefinitionValue": {
                        "argumentNames": params,
                        "body": (values.len() - 1).to_string(),
                    }
                })
            }
        }
    }
}

fn image_constant(value: impl Into<Value>) -> Expr {
    Expr::call("Image.constant", [("value", Expr::constant(value))])
}

pub fn area_of_interest(aoi: &AreaOfInterest) -> Expr {
    let point = Expr::call(
        "GeometryConstructors.Point",
        [(
            "coordinates",
            Expr::constant(json!([aoi.longitude(), aoi.latitude()])),
        )],
    );
    Expr::call(
        "Geometry.buffer",
        [
            ("geometry", point),
            ("distance", Expr::constant(aoi.radius_meters())),
        ],
    )
}

fn filter(collection: Expr, filter: Expr) -> Expr {
    Expr::call("Collection.filter", [("collection", collection), ("filter", filter)])
}

fn map(collection: Expr, body: Expr) -> Expr {
    Expr::call(
        "Collection.map",
        [
            ("collection", collection),
            ("baseAlgorithm", Expr::function(vec![MAPPING_VAR], body)),
        ],
    )
}

/// 依範圍、日期 [start, end) 與雲量門檻篩選的 Sentinel-2 影像集
pub fn filtered_collection(
    collection_id: &str,
    aoi: &AreaOfInterest,
    start: NaiveDate,
    end: NaiveDate,
    cloud_threshold_percent: f64,
) -> Expr {
    let loaded = Expr::call(
        "ImageCollection.load",
        [("id", Expr::constant(collection_id))],
    );
    let bounded = filter(
        loaded,
        Expr::call(
            "Filter.intersects",
            [
                ("leftField", Expr::constant(".all")),
                ("rightValue", area_of_interest(aoi)),
            ],
        ),
    );
    let dated = filter(
        bounded,
        Expr::call(
            "Filter.dateRangeContains",
            [
                (
                    "leftValue",
                    Expr::call(
                        "DateRange",
                        [
                            ("start", Expr::constant(start.format("%Y-%m-%d").to_string())),
                            ("end", Expr::constant(end.format("%Y-%m-%d").to_string())),
                        ],
                    ),
                ),
                ("rightField", Expr::constant("system:time_start")),
            ],
        ),
    );
    filter(
        dated,
        Expr::call(
            "Filter.lessThan",
            [
                ("leftField", Expr::constant("CLOUDY_PIXEL_PERCENTAGE")),
                ("rightValue", Expr::constant(cloud_threshold_percent)),
            ],
        ),
    )
}

/// QA60 第 10、11 位元（雲、卷雲）遮罩，並換算為反射率
pub fn mask_clouds(image: Expr) -> Expr {
    let qa = Expr::call(
        "Image.select",
        [
            ("input", image.clone()),
            ("bandSelectors", Expr::constant(json!(["QA60"]))),
        ],
    );
    let bit_clear = |bit: u32| {
        Expr::call(
            "Image.eq",
            [
                (
                    "image1",
                    Expr::call(
                        "Image.bitwiseAnd",
                        [("image1", qa.clone()), ("image2", image_constant(bit))],
                    ),
                ),
                ("image2", image_constant(0)),
            ],
        )
    };
    let mask = Expr::call(
        "Image.and",
        [("image1", bit_clear(CLOUD_BIT)), ("image2", bit_clear(CIRRUS_BIT))],
    );
    let scaled = Expr::call(
        "Image.divide",
        [
            (
                "image1",
                Expr::call("Image.updateMask", [("image", image.clone()), ("mask", mask)]),
            ),
            ("image2", image_constant(REFLECTANCE_SCALE)),
        ],
    );
    Expr::call(
        "Element.copyProperties",
        [
            ("destination", scaled),
            ("source", image),
            ("properties", Expr::constant(json!(["system:time_start"]))),
        ],
    )
}

pub fn spectral_index(image: Expr, index: SpectralIndex) -> Expr {
    let (a, b) = index.bands();
    Expr::call(
        "Image.rename",
        [
            (
                "input",
                Expr::call(
                    "Image.normalizedDifference",
                    [
                        ("input", image),
                        ("bandNames", Expr::constant(json!([a, b]))),
                    ],
                ),
            ),
            ("names", Expr::constant(json!([index.band_name()]))),
        ],
    )
}

/// 月中位數合成在 AOI 上的平均值；影像集為空時結果為 null
pub fn median_index_value(
    collection_id: &str,
    aoi: &AreaOfInterest,
    index: SpectralIndex,
    start: NaiveDate,
    end: NaiveDate,
    cloud_threshold_percent: f64,
) -> Expr {
    let collection = filtered_collection(collection_id, aoi, start, end, cloud_threshold_percent);
    let masked = map(collection.clone(), mask_clouds(Expr::Argument(MAPPING_VAR)));
    let indexed = map(masked, spectral_index(Expr::Argument(MAPPING_VAR), index));
    let median = Expr::call("reduce.median", [("collection", indexed)]);

    let reduced = Expr::call(
        "Image.reduceRegion",
        [
            ("image", median),
            ("reducer", Expr::call("Reducer.mean", [])),
            ("geometry", area_of_interest(aoi)),
            ("scale", Expr::constant(10)),
            ("maxPixels", Expr::constant(1e9)),
        ],
    );
    let value = Expr::call(
        "Dictionary.get",
        [
            ("dictionary", reduced),
            ("key", Expr::constant(index.band_name())),
        ],
    );

    Expr::call(
        "Algorithms.If",
        [
            (
                "condition",
                Expr::call(
                    "Number.gt",
                    [
                        ("left", collection_size(collection)),
                        ("right", Expr::constant(0)),
                    ],
                ),
            ),
            ("trueCase", value),
            ("falseCase", Expr::null()),
        ],
    )
}

pub fn collection_size(collection: Expr) -> Expr {
    Expr::call("Collection.size", [("collection", collection)])
}

/// 依拍攝時間排序後取最新一張
pub fn most_recent(collection: Expr) -> Expr {
    let sorted = Expr::call(
        "Collection.limit",
        [
            ("collection", collection),
            ("key", Expr::constant("system:time_start")),
            ("ascending", Expr::constant(false)),
        ],
    );
    Expr::call("Collection.first", [("collection", sorted)])
}

/// 最新雲量篩選影像的視覺化版本，裁切至 AOI
pub fn recent_view_image(
    collection_id: &str,
    aoi: &AreaOfInterest,
    view: ViewMode,
    start: NaiveDate,
    end: NaiveDate,
    cloud_threshold_percent: f64,
) -> Expr {
    let collection = filtered_collection(collection_id, aoi, start, end, cloud_threshold_percent);
    let masked = map(collection, mask_clouds(Expr::Argument(MAPPING_VAR)));
    let image = most_recent(masked);

    let rendered = match view.bands() {
        Some(bands) => Expr::call(
            "Image.select",
            [
                ("input", image),
                ("bandSelectors", Expr::constant(json!(bands))),
            ],
        ),
        None => spectral_index(image, SpectralIndex::Ndvi),
    };

    Expr::call(
        "Image.clip",
        [("input", rendered), ("geometry", area_of_interest(aoi))],
    )
}
